//! Default values for mirror configuration.

/// Upstream store being mirrored
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://chromewebstore.google.com";

/// Catalog document listing every mirrored item
pub const DEFAULT_CATALOG_URL: &str =
    "https://github.com/xixu-me/Chrome-Web-Store-Lister/releases/latest/download/data.json";

/// Catalog refresh interval (1 hour)
pub const DEFAULT_CATALOG_TTL_SECS: u64 = 3600;

pub const DEFAULT_MAX_SEARCH_RESULTS: usize = 100;

/// Sitemaps are capped well below the 50,000 URL protocol limit
pub const DEFAULT_MAX_SITEMAP_ENTRIES: usize = 5000;

pub fn default_listen() -> String {
    "127.0.0.1:8787".to_string()
}

pub fn default_upstream_base_url() -> String {
    DEFAULT_UPSTREAM_BASE_URL.to_string()
}

pub fn default_catalog_url() -> String {
    DEFAULT_CATALOG_URL.to_string()
}

pub fn default_catalog_ttl_secs() -> u64 {
    DEFAULT_CATALOG_TTL_SECS
}

pub fn default_max_search_results() -> usize {
    DEFAULT_MAX_SEARCH_RESULTS
}

pub fn default_max_sitemap_entries() -> usize {
    DEFAULT_MAX_SITEMAP_ENTRIES
}

pub fn default_upstream_timeout_secs() -> u64 {
    30
}

pub fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; webstore-mirror)".to_string()
}

pub fn default_shutdown_timeout_secs() -> u64 {
    30
}

pub fn default_site_name() -> String {
    "Chrome Web Store Mirror".to_string()
}

pub fn default_site_url() -> String {
    "https://chromewebstore.xi-xu.me".to_string()
}

pub fn default_site_description() -> String {
    "Browse and download Chrome extensions and themes safely. Access the Chrome Web Store with a secure mirror.".to_string()
}

pub fn default_site_keywords() -> String {
    "chrome extensions, web store mirror, browser extensions, chrome themes, crx download, extension mirror".to_string()
}

pub fn default_site_image() -> String {
    "/og-image.png".to_string()
}

pub fn default_twitter_handle() -> Option<String> {
    Some("@chromewebstore".to_string())
}
