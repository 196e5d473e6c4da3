// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Engram memory store.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Engram configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngramConfig {
    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Memory retrieval and metadata settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Search engine settings.
    #[serde(default)]
    pub search: SearchConfig,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Filesystem path of the SQLite database.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Whether to run the database in WAL journal mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("engram/engram.db").display().to_string())
        .unwrap_or_else(|| "engram.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// Memory retrieval and metadata configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Namespace prefix for privileged metadata keys. Keys equal to the
    /// prefix or under `<prefix>.` require an elevated caller.
    #[serde(default = "default_reserved_metadata_prefix")]
    pub reserved_metadata_prefix: String,

    /// Default last-N window for callers that do not request one.
    #[serde(default = "default_message_window")]
    pub message_window: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            reserved_metadata_prefix: default_reserved_metadata_prefix(),
            message_window: default_message_window(),
        }
    }
}

fn default_reserved_metadata_prefix() -> String {
    "system".to_string()
}

fn default_message_window() -> usize {
    12
}

/// Search engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Result limit applied when the caller does not specify one.
    #[serde(default = "default_search_limit")]
    pub default_limit: i64,

    /// Hard cap on the caller-supplied result limit.
    #[serde(default = "default_max_limit")]
    pub max_limit: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
            max_limit: default_max_limit(),
        }
    }
}

fn default_search_limit() -> i64 {
    10
}

fn default_max_limit() -> i64 {
    100
}
