// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Summary persistence. Summaries are append-only; the most recent by
//! creation time is authoritative for reads.

use chrono::{DateTime, Utc};
use engram_core::EngramError;
use engram_core::types::Summary;
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Insert a new summary without removing prior ones.
///
/// The summary point must reference a message of the same session. The
/// referenced message may already be soft-deleted; it only has to exist.
pub async fn insert_summary(db: &Database, summary: &Summary) -> Result<(), EngramError> {
    let summary = summary.clone();
    let boundary_id = summary.summary_point_id.clone();
    let inserted = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let boundary_ok: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM messages WHERE id = ?1 AND session_id = ?2)",
                params![summary.summary_point_id, summary.session_id],
                |row| row.get(0),
            )?;
            if !boundary_ok {
                return Ok(false);
            }

            tx.execute(
                "INSERT INTO summaries (id, session_id, content, token_count, summary_point_id, deleted, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
                params![
                    summary.id,
                    summary.session_id,
                    summary.content,
                    summary.token_count,
                    summary.summary_point_id,
                    summary.created_at,
                ],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)?;

    if inserted {
        Ok(())
    } else {
        Err(EngramError::not_found("summary point message", boundary_id))
    }
}

/// Get the most recently created live summary for a session, or `None`.
///
/// Soft-deleted summaries (from deleted session generations) are skipped,
/// so a revived session id starts without a summary.
pub async fn get_latest_summary(
    db: &Database,
    session_id: &str,
) -> Result<Option<Summary>, EngramError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, session_id, content, token_count, summary_point_id, created_at
                 FROM summaries WHERE session_id = ?1 AND deleted = 0
                 ORDER BY created_at DESC, rowid DESC LIMIT 1",
                params![session_id],
                row_to_summary,
            );
            match result {
                Ok(summary) => Ok(Some(summary)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

fn row_to_summary(row: &rusqlite::Row<'_>) -> Result<Summary, rusqlite::Error> {
    let created_at: DateTime<Utc> = row.get(5)?;
    Ok(Summary {
        id: row.get(0)?,
        session_id: row.get(1)?,
        content: row.get(2)?,
        token_count: row.get(3)?,
        summary_point_id: row.get(4)?,
        created_at,
    })
}
