// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message persistence: atomic batch appends and windowed reads.

use chrono::{DateTime, Utc};
use engram_core::EngramError;
use engram_core::types::{Message, NewMessage};
use rusqlite::params;
use uuid::Uuid;

use crate::database::{Database, map_tr_err};

/// Append a batch of messages to a session in one transaction.
///
/// Creates the session implicitly on the first write for an unseen id. A
/// write against a soft-deleted session revives the id as a fresh
/// generation; the old rows stay soft-deleted. Sequence numbers continue
/// from the maximum over all rows (deleted included) so they are never
/// reused. Either every message in the batch commits or none do.
///
/// Returns the stored messages with assigned ids, sequences, and timestamps.
pub async fn append_messages(
    db: &Database,
    session_id: &str,
    drafts: Vec<NewMessage>,
) -> Result<Vec<Message>, EngramError> {
    let session_id = session_id.to_string();
    let now = Utc::now();
    // Ids are assigned up front so the closure stays deterministic.
    let drafts: Vec<(String, NewMessage)> = drafts
        .into_iter()
        .map(|d| (Uuid::new_v4().to_string(), d))
        .collect();

    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO sessions (id, generation, deleted, created_at)
                 VALUES (?1, 1, 0, ?2)
                 ON CONFLICT(id) DO UPDATE
                     SET deleted = 0, deleted_at = NULL, generation = generation + 1
                     WHERE sessions.deleted = 1",
                params![session_id, now],
            )?;

            let next_seq: i64 = tx.query_row(
                "SELECT COALESCE(MAX(sequence), 0) + 1 FROM messages WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )?;

            let mut stored = Vec::with_capacity(drafts.len());
            for (offset, (id, draft)) in drafts.into_iter().enumerate() {
                let message = Message {
                    id,
                    session_id: session_id.clone(),
                    role: draft.role,
                    content: draft.content,
                    token_count: draft.token_count,
                    sequence: next_seq + offset as i64,
                    deleted: false,
                    created_at: now,
                };
                tx.execute(
                    "INSERT INTO messages (id, session_id, role, content, token_count, sequence, deleted, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
                    params![
                        message.id,
                        message.session_id,
                        message.role,
                        message.content,
                        message.token_count,
                        message.sequence,
                        message.created_at,
                    ],
                )?;
                stored.push(message);
            }

            tx.commit()?;
            Ok(stored)
        })
        .await
        .map_err(map_tr_err)
}

/// Get the most recent `n` live messages, in chronological order.
pub async fn get_recent_messages(
    db: &Database,
    session_id: &str,
    n: usize,
) -> Result<Vec<Message>, EngramError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, role, content, token_count, sequence, deleted, created_at
                 FROM messages WHERE session_id = ?1 AND deleted = 0
                 ORDER BY sequence DESC LIMIT ?2",
            )?;
            let mut messages = stmt
                .query_map(params![session_id, n as i64], row_to_message)?
                .collect::<Result<Vec<_>, _>>()?;
            // Selected newest-first; callers get chronological order.
            messages.reverse();
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

/// Get all live messages with a sequence strictly greater than `sequence`,
/// in chronological order.
pub async fn get_messages_after_sequence(
    db: &Database,
    session_id: &str,
    sequence: i64,
) -> Result<Vec<Message>, EngramError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, role, content, token_count, sequence, deleted, created_at
                 FROM messages WHERE session_id = ?1 AND deleted = 0 AND sequence > ?2
                 ORDER BY sequence ASC",
            )?;
            let messages = stmt
                .query_map(params![session_id, sequence], row_to_message)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

/// Get all live messages of a session, in chronological order.
pub async fn get_all_messages(
    db: &Database,
    session_id: &str,
) -> Result<Vec<Message>, EngramError> {
    get_messages_after_sequence(db, session_id, 0).await
}

/// Resolve a message's sequence number by id, consulting soft-deleted rows
/// too: summary boundaries must stay resolvable after deletion.
pub async fn get_message_sequence(
    db: &Database,
    message_id: &str,
) -> Result<Option<i64>, EngramError> {
    let message_id = message_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT sequence FROM messages WHERE id = ?1",
                params![message_id],
                |row| row.get::<_, i64>(0),
            );
            match result {
                Ok(seq) => Ok(Some(seq)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Map a rusqlite row onto a [`Message`].
fn row_to_message(row: &rusqlite::Row<'_>) -> Result<Message, rusqlite::Error> {
    let created_at: DateTime<Utc> = row.get(7)?;
    Ok(Message {
        id: row.get(0)?,
        session_id: row.get(1)?,
        role: row.get(2)?,
        content: row.get(3)?,
        token_count: row.get(4)?,
        sequence: row.get(5)?,
        deleted: row.get(6)?,
        created_at,
    })
}
