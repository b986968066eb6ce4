//! robots.txt handler.

use http::Response;

use crate::errors::ProxyError;
use crate::http_helpers::{ProxyBody, RequestInfo};

use super::generated;

pub fn handle_robots(info: &RequestInfo) -> Result<Response<ProxyBody>, ProxyError> {
    Ok(generated(
        "text/plain; charset=UTF-8",
        "public, max-age=86400",
        render_robots(&info.origin),
    )?)
}

/// Crawl everything except downloads
pub fn render_robots(origin: &str) -> String {
    format!(
        "# Robots.txt for the extension store mirror
# Allow crawling of all public pages

User-agent: *
Allow: /
Allow: /search/
Allow: /detail/

# Downloads are not useful for indexing
Disallow: /crx/

Crawl-delay: 1

Sitemap: {origin}/sitemap.xml

User-agent: Googlebot
Allow: /

User-agent: Bingbot
Allow: /

User-agent: Slurp
Allow: /
"
    )
}
