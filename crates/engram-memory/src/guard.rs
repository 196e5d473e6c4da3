// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Privilege guard for the reserved metadata namespace.

use engram_core::EngramError;
use engram_core::types::MessageMetadata;

/// Validates metadata batches against the reserved key namespace.
///
/// Keys equal to the reserved prefix, or nested under `<prefix>.`, may only
/// be created, updated, or deleted by a privileged caller. Rejection is
/// atomic: one reserved key from an unprivileged caller fails the entire
/// batch before anything is applied.
pub struct MetadataGuard {
    reserved_prefix: String,
}

impl MetadataGuard {
    pub fn new(reserved_prefix: impl Into<String>) -> Self {
        Self {
            reserved_prefix: reserved_prefix.into(),
        }
    }

    /// Whether a key falls in the reserved namespace.
    pub fn is_reserved(&self, key: &str) -> bool {
        key == self.reserved_prefix
            || key
                .strip_prefix(&self.reserved_prefix)
                .is_some_and(|rest| rest.starts_with('.'))
    }

    /// Validate a whole batch before it is applied.
    pub fn check_batch(
        &self,
        metadata_set: &[MessageMetadata],
        is_privileged: bool,
    ) -> Result<(), EngramError> {
        if is_privileged {
            return Ok(());
        }
        for entry in metadata_set {
            if self.is_reserved(&entry.key) {
                return Err(EngramError::PermissionDenied(format!(
                    "metadata key '{}' is under the reserved '{}' namespace",
                    entry.key, self.reserved_prefix
                )));
            }
        }
        Ok(())
    }
}
