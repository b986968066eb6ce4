//! Configuration linting for best practices
//!
//! Checks configuration for settings that work but are likely mistakes.

use super::{ValidationResult, ValidationWarning};
use crate::MirrorConfig;

/// Refreshing more often than this hammers the catalog host
const MIN_SENSIBLE_TTL_SECS: u64 = 60;

/// Lint configuration for best practices
pub fn lint_config(config: &MirrorConfig) -> ValidationResult {
    let mut result = ValidationResult::new();

    if config.upstream_timeout_secs == 0 {
        result.add_warning(ValidationWarning::new(
            "upstream_timeout_secs is 0: a stalled upstream stalls the request indefinitely",
        ));
    }

    if config.catalog_ttl_secs > 0 && config.catalog_ttl_secs < MIN_SENSIBLE_TTL_SECS {
        result.add_warning(ValidationWarning::new(format!(
            "catalog_ttl_secs is {}s (catalog refreshes on nearly every request)",
            config.catalog_ttl_secs
        )));
    }

    // Without an explicit origin the Host header decides where rewritten links point
    let public_bind = config.listen.starts_with("0.0.0.0") || config.listen.starts_with("[::]");
    if public_bind && config.public_origin.is_none() {
        result.add_warning(ValidationWarning::new(format!(
            "Listener '{}' is publicly bound without public_origin (origin taken from Host header)",
            config.listen
        )));
    }

    if config.max_sitemap_entries > 50_000 {
        result.add_warning(ValidationWarning::new(format!(
            "max_sitemap_entries {} exceeds the 50,000 URL sitemap limit",
            config.max_sitemap_entries
        )));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_clean() {
        let result = lint_config(&MirrorConfig::default());
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_lint_disabled_timeout() {
        let config = MirrorConfig {
            upstream_timeout_secs: 0,
            ..Default::default()
        };

        let result = lint_config(&config);

        assert!(result
            .warnings
            .iter()
            .any(|w| w.message.contains("stalled upstream")));
    }

    #[test]
    fn test_lint_public_bind_without_origin() {
        let config = MirrorConfig {
            listen: "0.0.0.0:80".to_string(),
            ..Default::default()
        };

        let result = lint_config(&config);

        assert!(result
            .warnings
            .iter()
            .any(|w| w.message.contains("without public_origin")));
    }

    #[test]
    fn test_lint_short_ttl() {
        let config = MirrorConfig {
            catalog_ttl_secs: 5,
            ..Default::default()
        };

        let result = lint_config(&config);

        assert!(result.warnings.iter().any(|w| w.message.contains("5s")));
    }
}
