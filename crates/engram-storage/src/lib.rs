// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Engram memory store.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, and typed query
//! modules for sessions, messages, summaries, metadata, and embeddings.
//!
//! All soft-delete bookkeeping lives here: deleted rows are excluded from
//! every read but retained for audit and summary-boundary resolution.

pub mod database;
pub mod migrations;
pub mod queries;

pub use database::Database;
