// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message metadata: keyed JSON values with create/overwrite/delete
//! semantics applied as an all-or-nothing batch.

use std::collections::HashMap;

use chrono::Utc;
use engram_core::EngramError;
use engram_core::types::MessageMetadata;
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Apply a metadata batch inside one transaction.
///
/// For each entry: create the key if absent, overwrite if present, delete
/// when the value is `None`. Every referenced message must exist in the
/// session (soft-deleted messages still count as existing); otherwise the
/// whole batch is rejected with [`EngramError::Conflict`] and nothing is
/// applied.
pub async fn upsert_metadata_batch(
    db: &Database,
    session_id: &str,
    metadata_set: Vec<MessageMetadata>,
) -> Result<(), EngramError> {
    let session_id = session_id.to_string();
    let now = Utc::now();
    // Serialize values up front so the write closure never touches serde.
    let mut entries = Vec::with_capacity(metadata_set.len());
    for entry in metadata_set {
        let value = match entry.value {
            Some(v) => Some(serde_json::to_string(&v).map_err(|e| EngramError::Storage {
                source: Box::new(e),
            })?),
            None => None,
        };
        entries.push((entry.message_id, entry.key, value));
    }

    let missing = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            for (message_id, key, value) in &entries {
                let exists: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM messages WHERE id = ?1 AND session_id = ?2)",
                    params![message_id, session_id],
                    |row| row.get(0),
                )?;
                if !exists {
                    // Dropping the transaction rolls back everything
                    // applied so far.
                    return Ok(Some(message_id.clone()));
                }

                match value {
                    Some(value) => {
                        tx.execute(
                            "INSERT INTO message_metadata (message_id, key, value, created_at, updated_at)
                             VALUES (?1, ?2, ?3, ?4, ?4)
                             ON CONFLICT(message_id, key) DO UPDATE
                                 SET value = excluded.value, updated_at = excluded.updated_at",
                            params![message_id, key, value, now],
                        )?;
                    }
                    None => {
                        tx.execute(
                            "DELETE FROM message_metadata WHERE message_id = ?1 AND key = ?2",
                            params![message_id, key],
                        )?;
                    }
                }
            }

            tx.commit()?;
            Ok(None)
        })
        .await
        .map_err(map_tr_err)?;

    match missing {
        Some(message_id) => Err(EngramError::Conflict(format!(
            "metadata write references unknown message {message_id}"
        ))),
        None => Ok(()),
    }
}

/// Snapshot all metadata attached to a session's live messages, keyed by
/// message id.
pub async fn get_metadata_for_session(
    db: &Database,
    session_id: &str,
) -> Result<HashMap<String, HashMap<String, serde_json::Value>>, EngramError> {
    let session_id = session_id.to_string();
    let rows: Vec<(String, String, String)> = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT md.message_id, md.key, md.value
                 FROM message_metadata md
                 JOIN messages m ON m.id = md.message_id
                 WHERE m.session_id = ?1 AND m.deleted = 0",
            )?;
            let rows = stmt
                .query_map(params![session_id], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)?;

    let mut snapshot: HashMap<String, HashMap<String, serde_json::Value>> = HashMap::new();
    for (message_id, key, value) in rows {
        let value = serde_json::from_str(&value).map_err(|e| EngramError::Storage {
            source: Box::new(e),
        })?;
        snapshot.entry(message_id).or_default().insert(key, value);
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::messages::append_messages;
    use engram_core::types::NewMessage;
    use serde_json::json;

    fn draft(content: &str) -> NewMessage {
        NewMessage {
            role: "user".to_string(),
            content: content.to_string(),
            token_count: None,
        }
    }

    fn entry(message_id: &str, key: &str, value: Option<serde_json::Value>) -> MessageMetadata {
        MessageMetadata {
            message_id: message_id.to_string(),
            key: key.to_string(),
            value,
        }
    }

    #[tokio::test]
    async fn create_overwrite_delete_cycle() {
        let db = Database::open_in_memory().await.unwrap();
        let messages = append_messages(&db, "s1", vec![draft("a")]).await.unwrap();
        let mid = &messages[0].id;

        upsert_metadata_batch(&db, "s1", vec![entry(mid, "topic", Some(json!("rust")))])
            .await
            .unwrap();
        let snapshot = get_metadata_for_session(&db, "s1").await.unwrap();
        assert_eq!(snapshot[mid]["topic"], json!("rust"));

        upsert_metadata_batch(&db, "s1", vec![entry(mid, "topic", Some(json!("go")))])
            .await
            .unwrap();
        let snapshot = get_metadata_for_session(&db, "s1").await.unwrap();
        assert_eq!(snapshot[mid]["topic"], json!("go"));

        upsert_metadata_batch(&db, "s1", vec![entry(mid, "topic", None)])
            .await
            .unwrap();
        let snapshot = get_metadata_for_session(&db, "s1").await.unwrap();
        assert!(snapshot.get(mid).is_none_or(|m| !m.contains_key("topic")));
    }

    #[tokio::test]
    async fn unknown_message_rejects_the_whole_batch() {
        let db = Database::open_in_memory().await.unwrap();
        let messages = append_messages(&db, "s1", vec![draft("a")]).await.unwrap();
        let mid = &messages[0].id;

        let err = upsert_metadata_batch(
            &db,
            "s1",
            vec![
                entry(mid, "good", Some(json!(1))),
                entry("ghost", "bad", Some(json!(2))),
            ],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngramError::Conflict(_)));

        // The valid entry must not have been applied.
        let snapshot = get_metadata_for_session(&db, "s1").await.unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn message_from_another_session_is_a_conflict() {
        let db = Database::open_in_memory().await.unwrap();
        append_messages(&db, "s1", vec![draft("a")]).await.unwrap();
        let other = append_messages(&db, "s2", vec![draft("b")]).await.unwrap();

        let err = upsert_metadata_batch(
            &db,
            "s1",
            vec![entry(&other[0].id, "k", Some(json!("v")))],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngramError::Conflict(_)));
    }

    #[tokio::test]
    async fn structured_values_roundtrip() {
        let db = Database::open_in_memory().await.unwrap();
        let messages = append_messages(&db, "s1", vec![draft("a")]).await.unwrap();
        let mid = &messages[0].id;

        let value = json!({"lang": "rust", "stars": 5, "tags": ["async", "sqlite"]});
        upsert_metadata_batch(&db, "s1", vec![entry(mid, "facets", Some(value.clone()))])
            .await
            .unwrap();

        let snapshot = get_metadata_for_session(&db, "s1").await.unwrap();
        assert_eq!(snapshot[mid]["facets"], value);
    }
}
