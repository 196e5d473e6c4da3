// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lookup and soft deletion.

use chrono::Utc;
use engram_core::EngramError;
use engram_core::types::Session;
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Get a session by id, including soft-deleted ones.
pub async fn get_session(db: &Database, id: &str) -> Result<Option<Session>, EngramError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, generation, deleted, created_at FROM sessions WHERE id = ?1",
            )?;
            let result = stmt.query_row(params![id], |row| {
                Ok(Session {
                    id: row.get(0)?,
                    generation: row.get(1)?,
                    deleted: row.get(2)?,
                    created_at: row.get(3)?,
                })
            });
            match result {
                Ok(session) => Ok(Some(session)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Soft-delete a session together with all its messages and summaries.
///
/// Idempotent: deleting an already-deleted or unknown session is a no-op.
/// Rows are retained for audit and summary-boundary resolution.
pub async fn soft_delete_session(db: &Database, id: &str) -> Result<(), EngramError> {
    let id = id.to_string();
    let now = Utc::now();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE sessions SET deleted = 1, deleted_at = ?1 WHERE id = ?2 AND deleted = 0",
                params![now, id],
            )?;
            tx.execute(
                "UPDATE messages SET deleted = 1 WHERE session_id = ?1 AND deleted = 0",
                params![id],
            )?;
            tx.execute(
                "UPDATE summaries SET deleted = 1 WHERE session_id = ?1 AND deleted = 0",
                params![id],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
