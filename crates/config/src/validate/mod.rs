//! Configuration validation
//!
//! Structural checks live here; best-practice warnings are in [`lint`] and
//! the optional reachability probe is in [`network`].

use std::fmt;
use url::Url;

use crate::MirrorConfig;

pub mod lint;
pub mod network;

/// Category of a validation error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Url,
    Limits,
    Listener,
    Network,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Url => "url",
            ErrorCategory::Limits => "limits",
            ErrorCategory::Listener => "listener",
            ErrorCategory::Network => "network",
        };
        f.write_str(name)
    }
}

/// A configuration problem that prevents startup
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub category: ErrorCategory,
    pub message: String,
}

impl ValidationError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

/// A configuration smell that does not prevent startup
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub message: String,
}

impl ValidationWarning {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Collected errors and warnings
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run the structural checks
pub fn validate_config(config: &MirrorConfig) -> ValidationResult {
    let mut result = ValidationResult::new();

    check_http_url(&mut result, "upstream_base_url", &config.upstream_base_url, true);
    check_http_url(&mut result, "catalog_url", &config.catalog_url, false);
    if let Some(ref origin) = config.public_origin {
        check_http_url(&mut result, "public_origin", origin, true);
    }

    if config.catalog_ttl_secs == 0 {
        result.add_error(ValidationError::new(
            ErrorCategory::Limits,
            "catalog_ttl_secs must be greater than zero",
        ));
    }
    if config.max_search_results == 0 {
        result.add_error(ValidationError::new(
            ErrorCategory::Limits,
            "max_search_results must be greater than zero",
        ));
    }

    if config.listen.parse::<std::net::SocketAddr>().is_err() {
        result.add_error(ValidationError::new(
            ErrorCategory::Listener,
            format!("listen '{}' is not a socket address", config.listen),
        ));
    }

    result
}

/// Check that `value` is an http(s) URL; origins must not carry a path
fn check_http_url(result: &mut ValidationResult, key: &str, value: &str, origin_only: bool) {
    let url = match Url::parse(value) {
        Ok(url) => url,
        Err(e) => {
            result.add_error(ValidationError::new(
                ErrorCategory::Url,
                format!("{key} '{value}' is not a valid URL: {e}"),
            ));
            return;
        }
    };

    if !matches!(url.scheme(), "http" | "https") {
        result.add_error(ValidationError::new(
            ErrorCategory::Url,
            format!("{key} '{value}' must use http or https"),
        ));
        return;
    }

    if origin_only && (url.path() != "/" || url.query().is_some()) {
        result.add_error(ValidationError::new(
            ErrorCategory::Url,
            format!("{key} '{value}' must be an origin without a path"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let result = validate_config(&MirrorConfig::default());
        assert!(result.is_valid(), "{:?}", result.errors);
    }

    #[test]
    fn test_origin_with_path_rejected() {
        let config = MirrorConfig {
            public_origin: Some("https://mirror.example.com/sub".to_string()),
            ..Default::default()
        };

        let result = validate_config(&config);
        assert!(result
            .errors
            .iter()
            .any(|e| e.message.contains("public_origin") && e.message.contains("without a path")));
    }

    #[test]
    fn test_catalog_url_may_have_path() {
        let config = MirrorConfig {
            catalog_url: "https://files.example.com/catalog/data.json".to_string(),
            ..Default::default()
        };
        assert!(validate_config(&config).is_valid());
    }

    #[test]
    fn test_bad_listen_address() {
        let config = MirrorConfig {
            listen: "localhost".to_string(),
            ..Default::default()
        };

        let result = validate_config(&config);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].category, ErrorCategory::Listener);
    }
}
