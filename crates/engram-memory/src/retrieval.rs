// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The memory retrieval decision tree.
//!
//! Chooses between "last N messages", "messages since the last summary
//! point", and "everything", always in chronological order and always
//! skipping soft-deleted rows.

use engram_core::EngramError;
use engram_core::types::Memory;
use engram_storage::Database;
use engram_storage::queries::{messages, summaries};

/// Retrieve a summary and a window of messages for a session.
///
/// - `last_n > 0`: most recent summary (if any) plus the most recent
///   `min(last_n, available)` live messages. The summary boundary does not
///   restrict this branch.
/// - `last_n == 0` with a summary: that summary plus all live messages
///   strictly after the summary point. The boundary message itself is
///   excluded even when undeleted.
/// - `last_n == 0` without a summary: every live message, no summary.
///
/// A session with no messages (empty, absent, or soft-deleted) yields an
/// empty [`Memory`], never an error: "exists but empty" and "absent" are
/// not distinguished at this layer.
pub async fn retrieve(
    db: &Database,
    session_id: &str,
    last_n: usize,
) -> Result<Memory, EngramError> {
    let summary = summaries::get_latest_summary(db, session_id).await?;

    if last_n > 0 {
        let messages = messages::get_recent_messages(db, session_id, last_n).await?;
        return Ok(Memory { summary, messages });
    }

    match summary {
        Some(summary) => {
            let boundary_seq =
                messages::get_message_sequence(db, &summary.summary_point_id)
                    .await?
                    .ok_or_else(|| {
                        // A summary always referenced an existing message at
                        // creation time; a dangling boundary is corruption.
                        EngramError::not_found(
                            "summary point message",
                            summary.summary_point_id.clone(),
                        )
                    })?;
            let messages =
                messages::get_messages_after_sequence(db, session_id, boundary_seq).await?;
            Ok(Memory {
                summary: Some(summary),
                messages,
            })
        }
        None => {
            let messages = messages::get_all_messages(db, session_id).await?;
            Ok(Memory {
                summary: None,
                messages,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use engram_core::types::{NewMessage, Summary};
    use engram_storage::queries::{sessions, summaries as summary_queries};
    use uuid::Uuid;

    fn draft(content: &str) -> NewMessage {
        NewMessage {
            role: "user".to_string(),
            content: content.to_string(),
            token_count: Some(4),
        }
    }

    /// Seeds a reference session: messages m1..m5 with a summary
    /// whose boundary is the third message.
    async fn seed_reference_session(db: &Database) -> Vec<engram_core::types::Message> {
        let drafts = (1..=5).map(|i| draft(&format!("m{i}"))).collect();
        let stored = messages::append_messages(db, "s1", drafts).await.unwrap();

        let summary = Summary {
            id: Uuid::new_v4().to_string(),
            session_id: "s1".to_string(),
            content: "m1 through m3, condensed".to_string(),
            token_count: Some(12),
            summary_point_id: stored[2].id.clone(),
            created_at: Utc::now(),
        };
        summary_queries::insert_summary(db, &summary).await.unwrap();
        stored
    }

    #[tokio::test]
    async fn zero_window_returns_messages_after_summary_point() {
        let db = Database::open_in_memory().await.unwrap();
        seed_reference_session(&db).await;

        let memory = retrieve(&db, "s1", 0).await.unwrap();
        assert!(memory.summary.is_some());
        assert_eq!(
            memory.messages.iter().map(|m| m.content.as_str()).collect::<Vec<_>>(),
            vec!["m4", "m5"]
        );
    }

    #[tokio::test]
    async fn boundary_message_is_excluded_even_when_undeleted() {
        let db = Database::open_in_memory().await.unwrap();
        let stored = seed_reference_session(&db).await;

        let memory = retrieve(&db, "s1", 0).await.unwrap();
        assert!(
            memory.messages.iter().all(|m| m.id != stored[2].id),
            "summary point message must not appear"
        );
    }

    #[tokio::test]
    async fn positive_window_ignores_summary_boundary() {
        let db = Database::open_in_memory().await.unwrap();
        seed_reference_session(&db).await;

        let memory = retrieve(&db, "s1", 2).await.unwrap();
        assert!(memory.summary.is_some());
        assert_eq!(
            memory.messages.iter().map(|m| m.content.as_str()).collect::<Vec<_>>(),
            vec!["m4", "m5"]
        );

        // A window larger than the session returns everything, summary
        // boundary notwithstanding.
        let memory = retrieve(&db, "s1", 10).await.unwrap();
        assert_eq!(memory.messages.len(), 5);
        assert_eq!(memory.messages[0].content, "m1");
    }

    #[tokio::test]
    async fn zero_window_without_summary_returns_everything() {
        let db = Database::open_in_memory().await.unwrap();
        messages::append_messages(&db, "s2", vec![draft("a"), draft("b")])
            .await
            .unwrap();

        let memory = retrieve(&db, "s2", 0).await.unwrap();
        assert!(memory.summary.is_none());
        assert_eq!(memory.messages.len(), 2);
    }

    #[tokio::test]
    async fn empty_and_absent_sessions_are_indistinguishable() {
        let db = Database::open_in_memory().await.unwrap();
        let memory = retrieve(&db, "never-written", 0).await.unwrap();
        assert!(memory.is_empty());

        let memory = retrieve(&db, "never-written", 7).await.unwrap();
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn deleted_session_reads_empty_without_error() {
        let db = Database::open_in_memory().await.unwrap();
        seed_reference_session(&db).await;
        sessions::soft_delete_session(&db, "s1").await.unwrap();

        let memory = retrieve(&db, "s1", 0).await.unwrap();
        assert!(memory.is_empty());
    }
}
