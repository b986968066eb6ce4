//! Network connectivity validation
//!
//! Validates that the upstream store and the catalog host are reachable.

use super::{ErrorCategory, ValidationError, ValidationResult, ValidationWarning};
use crate::MirrorConfig;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Validate upstream and catalog connectivity
pub async fn validate_upstreams(config: &MirrorConfig) -> ValidationResult {
    let mut result = ValidationResult::new();

    let targets = [
        ("upstream_base_url", config.upstream_base_url.as_str()),
        ("catalog_url", config.catalog_url.as_str()),
    ];

    for (key, value) in targets {
        let Some(address) = socket_address(value) else {
            result.add_error(ValidationError::new(
                ErrorCategory::Network,
                format!("{key} '{value}' has no resolvable host"),
            ));
            continue;
        };

        // Try to connect with timeout
        match timeout(CONNECT_TIMEOUT, TcpStream::connect(&address)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                result.add_error(ValidationError::new(
                    ErrorCategory::Network,
                    format!("{key} host '{address}' unreachable: {e}"),
                ));
            }
            Err(_) => {
                result.add_warning(ValidationWarning::new(format!(
                    "{key} host '{address}' connection timeout ({}s)",
                    CONNECT_TIMEOUT.as_secs()
                )));
            }
        }
    }

    result
}

/// `host:port` for an http(s) URL, using the scheme's default port
fn socket_address(value: &str) -> Option<String> {
    let url = Url::parse(value).ok()?;
    let host = url.host_str()?;
    let port = url.port_or_known_default()?;
    Some(format!("{host}:{port}"))
}
