// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding persistence with f32 BLOB storage.
//!
//! One vector per (message, model); a later write for the same pair
//! overwrites the earlier vector.

use chrono::Utc;
use engram_core::EngramError;
use engram_core::types::Embedding;
use rusqlite::params;
use rusqlite::types::FromSqlError;

use crate::database::{Database, map_tr_err};

/// Convert an f32 vector to little-endian bytes for BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert a stored BLOB back into an f32 vector.
///
/// A length that is not a multiple of four means the row is corrupt;
/// refusing it beats silently dropping the trailing bytes.
pub fn blob_to_vec(blob: &[u8]) -> Result<Vec<f32>, FromSqlError> {
    if blob.len() % 4 != 0 {
        return Err(FromSqlError::InvalidBlobSize {
            expected_size: blob.len() - blob.len() % 4,
            blob_size: blob.len(),
        });
    }
    Ok(blob
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes(chunk.try_into().expect("chunk is 4 bytes")))
        .collect())
}

/// Write a batch of embeddings in one transaction, overwriting any prior
/// vector for the same (message, model). Every referenced message must
/// exist in the session, otherwise the batch is rejected with
/// [`EngramError::Conflict`] and nothing is applied.
pub async fn upsert_embeddings(
    db: &Database,
    session_id: &str,
    embeddings: Vec<Embedding>,
) -> Result<(), EngramError> {
    let session_id = session_id.to_string();
    let now = Utc::now();
    let entries: Vec<(String, String, Vec<u8>)> = embeddings
        .into_iter()
        .map(|e| (e.message_id, e.model, vec_to_blob(&e.vector)))
        .collect();

    let missing = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            for (message_id, model, blob) in &entries {
                let exists: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM messages WHERE id = ?1 AND session_id = ?2)",
                    params![message_id, session_id],
                    |row| row.get(0),
                )?;
                if !exists {
                    return Ok(Some(message_id.clone()));
                }

                tx.execute(
                    "INSERT INTO message_embeddings (message_id, model, embedding, updated_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(message_id, model) DO UPDATE
                         SET embedding = excluded.embedding, updated_at = excluded.updated_at",
                    params![message_id, model, blob, now],
                )?;
            }

            tx.commit()?;
            Ok(None)
        })
        .await
        .map_err(map_tr_err)?;

    match missing {
        Some(message_id) => Err(EngramError::Conflict(format!(
            "embedding write references unknown message {message_id}"
        ))),
        None => Ok(()),
    }
}

/// Read all embeddings attached to a session's live messages.
pub async fn get_embeddings_for_session(
    db: &Database,
    session_id: &str,
) -> Result<Vec<Embedding>, EngramError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT e.message_id, e.model, e.embedding
                 FROM message_embeddings e
                 JOIN messages m ON m.id = e.message_id
                 WHERE m.session_id = ?1 AND m.deleted = 0
                 ORDER BY m.sequence ASC",
            )?;
            let embeddings = stmt
                .query_map(params![session_id], |row| {
                    let blob: Vec<u8> = row.get(2)?;
                    let vector = blob_to_vec(&blob).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            2,
                            rusqlite::types::Type::Blob,
                            Box::new(e),
                        )
                    })?;
                    Ok(Embedding {
                        message_id: row.get(0)?,
                        model: row.get(1)?,
                        vector,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(embeddings)
        })
        .await
        .map_err(map_tr_err)
}
