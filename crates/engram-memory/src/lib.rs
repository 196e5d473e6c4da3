// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieval policy and notification layer of the Engram memory store.
//!
//! This crate is the orchestration layer above the SQLite persistence
//! primitives in `engram-storage`:
//!
//! - **retrieval**: the GetMemory decision tree (last-N window, messages
//!   since the summary point, or everything)
//! - **registry**: extractor fan-out with per-extractor queues, detached
//!   worker lifetimes, and fault isolation
//! - **guard**: privilege checks for the reserved metadata namespace
//! - **search**: metadata filtering, pluggable scoring, ordering and
//!   truncation
//! - **store**: [`SqliteMemoryStore`], the single conforming
//!   implementation of the `MemoryStore` contract

pub mod guard;
pub mod registry;
pub mod retrieval;
pub mod search;
pub mod store;

pub use guard::MetadataGuard;
pub use registry::ExtractorRegistry;
pub use search::{SearchEngine, TokenOverlapScorer};
pub use store::SqliteMemoryStore;
