// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Engram memory store.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides via the `ENGRAM_` prefix.
//!
//! # Usage
//!
//! ```no_run
//! use engram_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("database: {}", config.storage.database_path);
//! ```

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{EngramConfig, MemoryConfig, SearchConfig, StorageConfig};

use engram_core::EngramError;

/// Load configuration from the XDG hierarchy and validate it.
///
/// Runs Figment extraction, then value-level validation. All failures are
/// reported as [`EngramError::Config`].
pub fn load_and_validate() -> Result<EngramConfig, EngramError> {
    let config = loader::load_config().map_err(|e| EngramError::Config(e.to_string()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<EngramConfig, EngramError> {
    let config =
        loader::load_config_from_str(toml_content).map_err(|e| EngramError::Config(e.to_string()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_and_validate_str_happy_path() {
        let config = load_and_validate_str("[search]\ndefault_limit = 5\n").unwrap();
        assert_eq!(config.search.default_limit, 5);
    }

    #[test]
    fn load_and_validate_str_surfaces_value_errors() {
        let err = load_and_validate_str("[search]\ndefault_limit = -1\n").unwrap_err();
        assert!(matches!(err, EngramError::Config(_)));
    }

    #[test]
    fn load_and_validate_str_surfaces_parse_errors() {
        let err = load_and_validate_str("[storage]\nwal_mode = \"maybe\"\n").unwrap_err();
        assert!(matches!(err, EngramError::Config(_)));
    }
}
