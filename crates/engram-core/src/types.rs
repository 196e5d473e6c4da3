// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types shared across the Engram workspace.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A conversation session. Created implicitly on the first write for an
/// unseen id, and owns all messages, summaries, metadata, and embeddings
/// stored under that id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Stable caller-supplied identifier.
    pub id: String,
    /// Generation counter. Soft-deleting a session and writing to the same
    /// id again starts a fresh generation instead of resurrecting old rows.
    pub generation: i64,
    /// Soft-delete flag. Deleted sessions are excluded from all reads.
    pub deleted: bool,
    /// ISO 8601 creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One turn in a conversation. Content is immutable once written; only the
/// deleted flag and attached metadata may change afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier (UUID v4).
    pub id: String,
    /// Owning session id.
    pub session_id: String,
    /// Speaker role ("user", "assistant", ...).
    pub role: String,
    /// Message text.
    pub content: String,
    /// Token count for context-budget accounting, if known.
    pub token_count: Option<i64>,
    /// Strictly increasing position within the session. Never reused,
    /// not even across soft-delete generations.
    pub sequence: i64,
    /// Soft-delete flag.
    pub deleted: bool,
    /// ISO 8601 creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A draft message handed to `put_memory`. The store assigns the id,
/// sequence, and timestamp at commit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<i64>,
}

/// A condensed representation of a session's history up to a boundary
/// message (the "summary point"). Summaries are append-only; the most
/// recent by creation time is authoritative for reads. The boundary
/// reference stays valid even if that message is later soft-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    /// Unique identifier (UUID v4).
    pub id: String,
    /// Owning session id.
    pub session_id: String,
    /// Condensed text.
    pub content: String,
    /// Token count of the condensed text, if known.
    pub token_count: Option<i64>,
    /// Id of the last message incorporated into this summary.
    pub summary_point_id: String,
    /// ISO 8601 creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One keyed metadata entry attached to a single message.
///
/// `value: None` is the deletion marker: upserting an entry with no value
/// removes the key. Keys under the reserved namespace require a privileged
/// caller (see the metadata guard).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageMetadata {
    pub message_id: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// A vector representation of one message's content under a named model.
/// A later write for the same (message, model) overwrites the prior vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub message_id: String,
    /// Identifier of the embedding model that produced the vector.
    pub model: String,
    #[serde(skip)]
    pub vector: Vec<f32>,
}

/// The payload delivered to extractors after a batch of messages commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    pub session_id: String,
    /// The newly committed messages, in commit (sequence) order.
    pub messages: Vec<Message>,
    pub timestamp: DateTime<Utc>,
}

/// The result shape of a memory retrieval: the authoritative summary, if
/// any, plus the selected window of messages in chronological order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Memory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    pub messages: Vec<Message>,
}

impl Memory {
    /// True when neither a summary nor any messages were selected.
    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.messages.is_empty()
    }
}

/// A search request: free text plus an optional exact-match metadata filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    #[serde(default, rename = "meta", skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl SearchQuery {
    /// A query with no metadata filter.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: None,
        }
    }
}

/// One search hit. `summary` is reserved for future summary search and is
/// absent under default scoring. Lower `dist` means more similar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub message: Message,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    #[serde(default, rename = "meta", skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    pub dist: f64,
}
