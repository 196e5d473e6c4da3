// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extractor contract for post-commit message processing.

use async_trait::async_trait;

use crate::error::EngramError;
use crate::types::MessageEvent;

/// An observer notified after new messages durably commit.
///
/// Extractors run outside the write path: a failing or slow extractor
/// never blocks the triggering write or delivery to other extractors. For
/// a given session, one extractor receives events in commit order; nothing
/// is guaranteed across extractors or across sessions.
///
/// An extractor that writes back into the store (embeddings, a new
/// summary) must do so with `suppress_notify = true` to avoid re-entering
/// its own pipeline.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Stable name used for registry bookkeeping and log attribution.
    fn name(&self) -> &str;

    /// Handles one batch of newly committed messages.
    async fn notify(&self, event: &MessageEvent) -> Result<(), EngramError>;
}
