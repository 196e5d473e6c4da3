// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Engram conversational memory store.
//!
//! This crate provides the foundational trait definitions, error type, and
//! domain model shared across the Engram workspace. The persistence backend
//! and the policy layer both implement contracts defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::EngramError;
pub use traits::{Extractor, MemoryStore, Scorer};
pub use types::{
    Embedding, Memory, Message, MessageEvent, MessageMetadata, NewMessage, SearchQuery,
    SearchResult, Session, Summary,
};
