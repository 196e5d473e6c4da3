// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The backend contract every memory store implementation must satisfy.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::EngramError;
use crate::traits::extractor::Extractor;
use crate::types::{
    Embedding, Memory, Message, MessageEvent, MessageMetadata, NewMessage, SearchQuery,
    SearchResult, Summary,
};

/// The persistence and orchestration contract for conversational memory.
///
/// Implementations own the storage backend, the extractor registry, and the
/// retrieval/search policy. Callers hold a single `Arc<dyn MemoryStore>`
/// selected at construction time.
///
/// Concurrency model: writes to a single session are serialized relative to
/// each other; writes to different sessions proceed independently. Reads may
/// run concurrently with writes and observe the most recently committed
/// state, never a partial batch.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Returns a summary and a window of messages for a session.
    ///
    /// - `last_n > 0`: the most recent summary (if any) plus the most
    ///   recent `min(last_n, available)` undeleted messages.
    /// - `last_n == 0` with a summary: all undeleted messages after the
    ///   summary point, boundary message excluded.
    /// - `last_n == 0` without a summary: all undeleted messages.
    ///
    /// An empty or absent session yields an empty [`Memory`], not an error.
    async fn get_memory(&self, session_id: &str, last_n: usize) -> Result<Memory, EngramError>;

    /// Returns the most recently created summary for a session, or `None`.
    async fn get_summary(&self, session_id: &str) -> Result<Option<Summary>, EngramError>;

    /// Appends a batch of messages atomically, creating the session if
    /// absent, and notifies attached extractors unless `suppress_notify`
    /// is set. Returns the stored messages with assigned ids and sequences.
    ///
    /// Extractor callbacks that write back into the store pass
    /// `suppress_notify = true` to avoid re-entering their own pipeline.
    async fn put_memory(
        &self,
        session_id: &str,
        messages: Vec<NewMessage>,
        suppress_notify: bool,
    ) -> Result<Vec<Message>, EngramError>;

    /// Appends a new summary. Prior summaries are retained; the newest
    /// wins for reads. The summary point must reference a message that
    /// exists in the same session.
    async fn put_summary(&self, session_id: &str, summary: Summary) -> Result<(), EngramError>;

    /// Creates, overwrites, or deletes metadata entries for messages in a
    /// session. An entry with `value: None` deletes its key. The whole
    /// batch is validated against the reserved namespace first; a reserved
    /// key from an unprivileged caller rejects the batch atomically.
    async fn put_message_metadata(
        &self,
        session_id: &str,
        metadata_set: Vec<MessageMetadata>,
        is_privileged: bool,
    ) -> Result<(), EngramError>;

    /// Writes one embedding per (message, model), overwriting prior vectors.
    async fn put_message_vectors(
        &self,
        session_id: &str,
        embeddings: Vec<Embedding>,
    ) -> Result<(), EngramError>;

    /// Reads all embeddings attached to a session's undeleted messages.
    async fn get_message_vectors(&self, session_id: &str) -> Result<Vec<Embedding>, EngramError>;

    /// Searches a session's undeleted messages, applying the query's
    /// metadata filter exactly, ordering ascending by distance with ties
    /// broken by recency, and truncating to `limit`. `limit <= 0` is an
    /// invalid argument.
    async fn search_memory(
        &self,
        session_id: &str,
        query: &SearchQuery,
        limit: i64,
    ) -> Result<Vec<SearchResult>, EngramError>;

    /// Soft-deletes a session and everything it owns. Idempotent: deleting
    /// twice is not an error. A subsequent `put_memory` on the same id
    /// starts a fresh generation rather than resurrecting deleted rows.
    async fn delete_session(&self, session_id: &str) -> Result<(), EngramError>;

    /// Registers an extractor to receive [`MessageEvent`]s for newly
    /// committed writes. Safe to call concurrently with dispatch.
    fn attach(&self, extractor: Arc<dyn Extractor>);

    /// Fans an event out to every attached extractor, unless suppressed.
    /// Dispatch is detached from the caller's cancellation scope and never
    /// surfaces extractor failures to the caller.
    fn notify_extractors(&self, event: MessageEvent, suppress: bool);

    /// Acquires backend resources. Called at most once per process
    /// lifetime, before any request traffic.
    async fn on_start(&self) -> Result<(), EngramError>;

    /// Releases backend resources, flushing pending writes. Safe to call
    /// even if `on_start` partially failed.
    async fn close(&self) -> Result<(), EngramError>;
}
