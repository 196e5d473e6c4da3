// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The single conforming [`MemoryStore`] implementation, backed by SQLite.
//!
//! Composes the persistence layer with the retrieval policy, the metadata
//! guard, the search engine, and the extractor registry. The database is
//! lazily opened on [`MemoryStore::on_start`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use engram_config::EngramConfig;
use engram_core::types::{
    Embedding, Memory, Message, MessageEvent, MessageMetadata, NewMessage, SearchQuery,
    SearchResult, Summary,
};
use engram_core::{EngramError, Extractor, MemoryStore, Scorer};
use engram_storage::Database;
use engram_storage::queries::{messages, metadata, sessions, summaries, vectors};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::guard::MetadataGuard;
use crate::registry::ExtractorRegistry;
use crate::retrieval;
use crate::search::{SearchEngine, TokenOverlapScorer};

/// SQLite-backed memory store.
///
/// The connection is not opened until [`MemoryStore::on_start`]; `close`
/// is safe to call even when startup failed partway.
pub struct SqliteMemoryStore {
    config: EngramConfig,
    db: OnceCell<Database>,
    registry: ExtractorRegistry,
    guard: MetadataGuard,
    search: SearchEngine,
    // Per-session ordering locks, held across commit plus notification
    // enqueue so extractors observe batches in commit order. Entries live
    // for the process lifetime of the store.
    write_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SqliteMemoryStore {
    /// Create a store with the default token-overlap scorer.
    pub fn new(config: EngramConfig) -> Self {
        Self::with_scorer(config, Arc::new(TokenOverlapScorer))
    }

    /// Create a store with an externally supplied similarity scorer.
    pub fn with_scorer(config: EngramConfig, scorer: Arc<dyn Scorer>) -> Self {
        let guard = MetadataGuard::new(config.memory.reserved_metadata_prefix.clone());
        let search = SearchEngine::new(scorer, config.search.max_limit);
        Self {
            config,
            db: OnceCell::new(),
            registry: ExtractorRegistry::new(),
            guard,
            search,
            write_locks: Mutex::new(HashMap::new()),
        }
    }

    fn write_lock(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.write_locks.lock().expect("write lock table poisoned");
        Arc::clone(locks.entry(session_id.to_string()).or_default())
    }

    /// Remove an extractor registration by name.
    pub fn detach(&self, name: &str) {
        self.registry.detach(name);
    }

    /// Retrieve with the configured default message window.
    ///
    /// Convenience for callers that do not pick a window themselves; the
    /// size comes from `memory.message_window`.
    pub async fn recent_memory(&self, session_id: &str) -> Result<Memory, EngramError> {
        self.get_memory(session_id, self.config.memory.message_window)
            .await
    }

    /// Search with the configured default result limit
    /// (`search.default_limit`).
    pub async fn search_with_default_limit(
        &self,
        session_id: &str,
        query: &SearchQuery,
    ) -> Result<Vec<SearchResult>, EngramError> {
        self.search_memory(session_id, query, self.config.search.default_limit)
            .await
    }

    /// Returns the open database, or an error when `on_start` has not run.
    fn database(&self) -> Result<&Database, EngramError> {
        self.db.get().ok_or_else(|| EngramError::Storage {
            source: "store not started -- call on_start() first".into(),
        })
    }

    fn check_session_id(session_id: &str) -> Result<(), EngramError> {
        if session_id.trim().is_empty() {
            return Err(EngramError::InvalidArgument(
                "session id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl MemoryStore for SqliteMemoryStore {
    async fn get_memory(&self, session_id: &str, last_n: usize) -> Result<Memory, EngramError> {
        Self::check_session_id(session_id)?;
        retrieval::retrieve(self.database()?, session_id, last_n).await
    }

    async fn get_summary(&self, session_id: &str) -> Result<Option<Summary>, EngramError> {
        Self::check_session_id(session_id)?;
        summaries::get_latest_summary(self.database()?, session_id).await
    }

    async fn put_memory(
        &self,
        session_id: &str,
        drafts: Vec<NewMessage>,
        suppress_notify: bool,
    ) -> Result<Vec<Message>, EngramError> {
        Self::check_session_id(session_id)?;
        if drafts.is_empty() {
            return Err(EngramError::InvalidArgument(
                "message batch must not be empty".to_string(),
            ));
        }

        // The session lock is held from commit through enqueue: without it
        // two writers could commit in one order and reach the registry in
        // the other, handing extractors batches out of sequence order.
        let lock = self.write_lock(session_id);
        let _ordering = lock.lock().await;

        let stored = messages::append_messages(self.database()?, session_id, drafts).await?;

        // The batch has durably committed; notification runs on its own
        // lifetime and cannot fail the write.
        let event = MessageEvent {
            session_id: session_id.to_string(),
            messages: stored.clone(),
            timestamp: Utc::now(),
        };
        self.notify_extractors(event, suppress_notify);

        Ok(stored)
    }

    async fn put_summary(&self, session_id: &str, summary: Summary) -> Result<(), EngramError> {
        Self::check_session_id(session_id)?;
        if summary.session_id != session_id {
            return Err(EngramError::InvalidArgument(format!(
                "summary belongs to session '{}', not '{session_id}'",
                summary.session_id
            )));
        }
        summaries::insert_summary(self.database()?, &summary).await
    }

    async fn put_message_metadata(
        &self,
        session_id: &str,
        metadata_set: Vec<MessageMetadata>,
        is_privileged: bool,
    ) -> Result<(), EngramError> {
        Self::check_session_id(session_id)?;
        // Guard first: a reserved key from an unprivileged caller rejects
        // the batch before any row is touched.
        self.guard.check_batch(&metadata_set, is_privileged)?;
        metadata::upsert_metadata_batch(self.database()?, session_id, metadata_set).await
    }

    async fn put_message_vectors(
        &self,
        session_id: &str,
        embeddings: Vec<Embedding>,
    ) -> Result<(), EngramError> {
        Self::check_session_id(session_id)?;
        vectors::upsert_embeddings(self.database()?, session_id, embeddings).await
    }

    async fn get_message_vectors(&self, session_id: &str) -> Result<Vec<Embedding>, EngramError> {
        Self::check_session_id(session_id)?;
        vectors::get_embeddings_for_session(self.database()?, session_id).await
    }

    async fn search_memory(
        &self,
        session_id: &str,
        query: &SearchQuery,
        limit: i64,
    ) -> Result<Vec<SearchResult>, EngramError> {
        Self::check_session_id(session_id)?;
        self.search
            .search(self.database()?, session_id, query, limit)
            .await
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), EngramError> {
        Self::check_session_id(session_id)?;
        sessions::soft_delete_session(self.database()?, session_id).await
    }

    fn attach(&self, extractor: Arc<dyn Extractor>) {
        debug!(extractor = extractor.name(), "attaching extractor");
        self.registry.attach(extractor);
    }

    fn notify_extractors(&self, event: MessageEvent, suppress: bool) {
        self.registry.notify(event, suppress);
    }

    async fn on_start(&self) -> Result<(), EngramError> {
        let db = Database::open_with(
            &self.config.storage.database_path,
            self.config.storage.wal_mode,
        )
        .await?;
        self.db.set(db).map_err(|_| EngramError::Storage {
            source: "store already started".into(),
        })?;
        debug!(path = %self.config.storage.database_path, "memory store started");
        Ok(())
    }

    async fn close(&self) -> Result<(), EngramError> {
        // A store that never finished starting has nothing to release.
        if let Some(db) = self.db.get() {
            db.close().await?;
        }
        Ok(())
    }
}
