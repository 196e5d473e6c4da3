// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pluggable similarity scorer used by the search engine.

use crate::types::Message;

/// Scores a candidate message against free-text query.
///
/// The convention is distance: lower values mean more similar. The search
/// engine only depends on this ordering; the scoring algorithm itself
/// (lexical, vector, hybrid) is an external concern.
pub trait Scorer: Send + Sync {
    /// Distance between the query text and one candidate message.
    fn distance(&self, query: &str, candidate: &Message) -> f64;
}
