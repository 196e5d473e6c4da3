// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contract trait definitions for the Engram memory store.
//!
//! All async contracts use `#[async_trait]` for dynamic dispatch
//! compatibility. Each trait has exactly one conforming implementation
//! selected at construction time.

pub mod extractor;
pub mod scorer;
pub mod store;

pub use extractor::Extractor;
pub use scorer::Scorer;
pub use store::MemoryStore;
