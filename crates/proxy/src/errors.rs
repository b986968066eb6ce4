//! Error types for the mirror proxy.
//!
//! Catalog failures never leave [`crate::catalog::CatalogCache`]; they are
//! logged and absorbed there. Proxy failures travel up to the router, which
//! is the one place that turns them into error pages.

use http::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Failure while fetching or building a proxied response
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("upstream {target} did not respond within {}s", .after.as_secs())]
    Timeout { target: String, after: Duration },

    #[error("invalid upstream target '{0}'")]
    InvalidTarget(String),

    #[error("failed to build response: {0}")]
    Response(#[from] http::Error),

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl ProxyError {
    /// Short label used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Upstream(e) if e.is_connect() => "connect",
            ProxyError::Upstream(_) => "upstream",
            ProxyError::Timeout { .. } => "timeout",
            ProxyError::InvalidTarget(_) => "invalid_target",
            ProxyError::Response(_) => "response",
            ProxyError::ClientBuild(_) => "client_build",
        }
    }
}

/// Failure of a single catalog refresh attempt
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog host answered {0}")]
    Status(StatusCode),
}
