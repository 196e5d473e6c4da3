// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation of configuration values.
//!
//! Serde catches structural problems (unknown keys, type mismatches);
//! this module catches value-level problems that are syntactically valid.

use engram_core::EngramError;

use crate::model::EngramConfig;

/// Validate value-level constraints on a deserialized config.
pub fn validate_config(config: &EngramConfig) -> Result<(), EngramError> {
    if config.storage.database_path.trim().is_empty() {
        return Err(EngramError::Config(
            "storage.database_path must not be empty".to_string(),
        ));
    }
    if config.memory.reserved_metadata_prefix.trim().is_empty() {
        return Err(EngramError::Config(
            "memory.reserved_metadata_prefix must not be empty".to_string(),
        ));
    }
    if config.search.max_limit <= 0 {
        return Err(EngramError::Config(
            "search.max_limit must be positive".to_string(),
        ));
    }
    if config.search.default_limit <= 0 {
        return Err(EngramError::Config(
            "search.default_limit must be positive".to_string(),
        ));
    }
    if config.search.default_limit > config.search.max_limit {
        return Err(EngramError::Config(format!(
            "search.default_limit ({}) exceeds search.max_limit ({})",
            config.search.default_limit, config.search.max_limit
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        validate_config(&EngramConfig::default()).unwrap();
    }

    #[test]
    fn empty_database_path_is_rejected() {
        let mut config = EngramConfig::default();
        config.storage.database_path = "  ".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, EngramError::Config(_)));
    }

    #[test]
    fn empty_reserved_prefix_is_rejected() {
        let mut config = EngramConfig::default();
        config.memory.reserved_metadata_prefix = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn default_limit_above_max_is_rejected() {
        let mut config = EngramConfig::default();
        config.search.default_limit = 200;
        config.search.max_limit = 100;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("default_limit"));
    }

    #[test]
    fn non_positive_limits_are_rejected() {
        let mut config = EngramConfig::default();
        config.search.default_limit = 0;
        assert!(validate_config(&config).is_err());

        let mut config = EngramConfig::default();
        config.search.max_limit = -5;
        assert!(validate_config(&config).is_err());
    }
}
