// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Engram memory store.

use thiserror::Error;

/// The primary error type used across all Engram contracts and core operations.
#[derive(Debug, Error)]
pub enum EngramError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// A referenced session, message, or summary does not exist.
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// Privileged-metadata violation: a reserved key was written without authority.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Malformed input: empty session id, non-positive limit, empty query.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A write referenced a message that does not exist in the session.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Transient backend failure. The caller may retry.
    #[error("backend unavailable: {source}")]
    Unavailable {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Unexpected backend error (connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors outside the persistence path.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngramError {
    /// Shorthand for a NotFound error.
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        EngramError::NotFound {
            resource,
            id: id.into(),
        }
    }

    /// True when the failure is transient and the operation may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngramError::Unavailable { .. })
    }
}
