//! Configuration for the extension store mirror.
//!
//! Configuration is read from an optional TOML file. Every key has a default,
//! so an empty file (or no file at all) yields a working mirror of the
//! Chrome Web Store.
//!
//! ```toml
//! listen = "0.0.0.0:8787"
//! public_origin = "https://mirror.example.com"
//! catalog_ttl_secs = 1800
//!
//! [site]
//! name = "My Mirror"
//! ```

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

pub mod defaults;
pub mod validate;

use defaults::*;
pub use validate::{ErrorCategory, ValidationError, ValidationResult, ValidationWarning};

/// Embedded default configuration file
const DEFAULT_CONFIG_TOML: &str = include_str!("../default.toml");

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Mirror configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MirrorConfig {
    /// Socket address to listen on
    pub listen: String,

    /// Origin of the mirrored store; every occurrence in proxied text is rewritten
    pub upstream_base_url: String,

    /// JSON document listing the catalog items
    pub catalog_url: String,

    /// How long a fetched catalog is served before a refresh is attempted
    pub catalog_ttl_secs: u64,

    /// Maximum number of search results rendered client-side
    pub max_search_results: usize,

    /// Maximum number of detail pages listed in sitemap.xml
    pub max_sitemap_entries: usize,

    /// Bound on waiting for upstream response headers (0 disables)
    pub upstream_timeout_secs: u64,

    /// Public origin of the mirror. Derived from the request when unset.
    pub public_origin: Option<String>,

    /// User-Agent sent upstream when the client did not send one
    pub default_user_agent: String,

    /// Time allowed for in-flight connections to finish on shutdown
    pub shutdown_timeout_secs: u64,

    /// Branding and SEO settings
    pub site: SiteConfig,
}

/// Branding and SEO settings used by the generated pages
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub name: String,
    /// Canonical site URL used in structured data
    pub url: String,
    pub description: String,
    pub keywords: String,
    /// Social share image, absolute or relative to `url`
    pub image: String,
    pub twitter_handle: Option<String>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            upstream_base_url: default_upstream_base_url(),
            catalog_url: default_catalog_url(),
            catalog_ttl_secs: default_catalog_ttl_secs(),
            max_search_results: default_max_search_results(),
            max_sitemap_entries: default_max_sitemap_entries(),
            upstream_timeout_secs: default_upstream_timeout_secs(),
            public_origin: None,
            default_user_agent: default_user_agent(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            site: SiteConfig::default(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            url: default_site_url(),
            description: default_site_description(),
            keywords: default_site_keywords(),
            image: default_site_image(),
            twitter_handle: default_twitter_handle(),
        }
    }
}

impl MirrorConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading configuration file");

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: MirrorConfig = toml::from_str(contents)?;
        trace!(
            listen = %config.listen,
            upstream = %config.upstream_base_url,
            catalog = %config.catalog_url,
            "Parsed configuration"
        );
        Ok(config)
    }

    /// The configuration shipped with the binary
    pub fn default_embedded() -> Result<Self, ConfigError> {
        Self::from_toml_str(DEFAULT_CONFIG_TOML)
    }

    /// Validate the configuration, failing on the first set of errors
    pub fn validate(&self) -> Result<(), ConfigError> {
        let result = validate::validate_config(self);
        if result.is_valid() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(
                result.errors.iter().map(|e| e.to_string()).collect(),
            ))
        }
    }

    /// Upstream origin without a trailing slash
    pub fn upstream_origin(&self) -> &str {
        self.upstream_base_url.trim_end_matches('/')
    }

    /// Public origin override without a trailing slash
    pub fn public_origin(&self) -> Option<&str> {
        self.public_origin
            .as_deref()
            .map(|origin| origin.trim_end_matches('/'))
    }

    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_secs)
    }

    pub fn upstream_timeout(&self) -> Option<Duration> {
        match self.upstream_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}
