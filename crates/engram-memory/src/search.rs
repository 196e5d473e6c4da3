// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The search engine: metadata filtering, pluggable scoring, and the
//! ordering/truncation contract.
//!
//! Results are ordered ascending by distance (lower = more similar), ties
//! broken by the more recent message, and truncated to the caller's limit.
//! The similarity algorithm itself is behind the [`Scorer`] trait; the
//! default here is a deterministic token-overlap stand-in.

use std::collections::HashSet;
use std::sync::Arc;

use engram_core::types::{Message, SearchQuery, SearchResult};
use engram_core::{EngramError, Scorer};
use engram_storage::Database;
use engram_storage::queries::{messages, metadata};
use tracing::debug;

/// Executes search requests against a session's live messages.
pub struct SearchEngine {
    scorer: Arc<dyn Scorer>,
    max_limit: i64,
}

impl SearchEngine {
    pub fn new(scorer: Arc<dyn Scorer>, max_limit: i64) -> Self {
        Self { scorer, max_limit }
    }

    /// Run a query against one session.
    ///
    /// Candidates are filtered by exact match on every key/value pair of
    /// the query's metadata filter (empty filter = no restriction), scored,
    /// sorted ascending by distance with recency breaking ties, and
    /// truncated to `limit`. `limit <= 0` and an empty query text are
    /// invalid arguments.
    pub async fn search(
        &self,
        db: &Database,
        session_id: &str,
        query: &SearchQuery,
        limit: i64,
    ) -> Result<Vec<SearchResult>, EngramError> {
        if limit <= 0 {
            return Err(EngramError::InvalidArgument(format!(
                "search limit must be positive, got {limit}"
            )));
        }
        if query.text.trim().is_empty() {
            return Err(EngramError::InvalidArgument(
                "search query text must not be empty".to_string(),
            ));
        }
        let limit = limit.min(self.max_limit) as usize;

        let candidates = messages::get_all_messages(db, session_id).await?;
        let mut snapshot = metadata::get_metadata_for_session(db, session_id).await?;

        // Filter first, then score; the second pass consumes the metadata
        // snapshot to attach each hit's entries.
        let filtered: Vec<Message> = candidates
            .into_iter()
            .filter(|message| match &query.metadata {
                Some(filter) if !filter.is_empty() => {
                    let meta = snapshot.get(&message.id);
                    filter.iter().all(|(key, expected)| {
                        meta.and_then(|m| m.get(key)) == Some(expected)
                    })
                }
                _ => true,
            })
            .collect();

        let mut results: Vec<SearchResult> = filtered
            .into_iter()
            .map(|message| {
                let dist = self.scorer.distance(&query.text, &message);
                SearchResult {
                    metadata: snapshot.remove(&message.id),
                    summary: None,
                    message,
                    dist,
                }
            })
            .collect();

        // Ascending distance; the more recent message wins a tie.
        results.sort_by(|a, b| {
            a.dist
                .partial_cmp(&b.dist)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.message.sequence.cmp(&a.message.sequence))
        });
        results.truncate(limit);

        debug!(
            session_id,
            hits = results.len(),
            "search complete"
        );
        Ok(results)
    }
}

/// Deterministic token-overlap scorer.
///
/// Distance is `1 - |q ∩ c| / |q ∪ c|` over lowercased alphanumeric
/// tokens: 0.0 for identical token sets, 1.0 for disjoint ones. It stands
/// in for the externally pluggable similarity model while preserving the
/// ordering convention the search contract depends on.
#[derive(Debug, Default)]
pub struct TokenOverlapScorer;

impl TokenOverlapScorer {
    fn tokens(text: &str) -> HashSet<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect()
    }
}

impl Scorer for TokenOverlapScorer {
    fn distance(&self, query: &str, candidate: &Message) -> f64 {
        let query_tokens = Self::tokens(query);
        let candidate_tokens = Self::tokens(&candidate.content);
        if query_tokens.is_empty() || candidate_tokens.is_empty() {
            return 1.0;
        }
        let intersection = query_tokens.intersection(&candidate_tokens).count();
        let union = query_tokens.union(&candidate_tokens).count();
        1.0 - intersection as f64 / union as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use engram_core::types::{MessageMetadata, NewMessage};
    use serde_json::json;

    fn draft(content: &str) -> NewMessage {
        NewMessage {
            role: "user".to_string(),
            content: content.to_string(),
            token_count: None,
        }
    }

    fn engine() -> SearchEngine {
        SearchEngine::new(Arc::new(TokenOverlapScorer), 100)
    }

    fn candidate(content: &str, sequence: i64) -> Message {
        Message {
            id: format!("m{sequence}"),
            session_id: "s1".to_string(),
            role: "user".to_string(),
            content: content.to_string(),
            token_count: None,
            sequence,
            deleted: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn token_overlap_orders_by_similarity() {
        let scorer = TokenOverlapScorer;
        let exact = candidate("the borrow checker", 1);
        let partial = candidate("the garbage collector", 2);
        let disjoint = candidate("quantum physics", 3);

        let query = "the borrow checker";
        let d_exact = scorer.distance(query, &exact);
        let d_partial = scorer.distance(query, &partial);
        let d_disjoint = scorer.distance(query, &disjoint);

        assert!(d_exact < d_partial, "{d_exact} !< {d_partial}");
        assert!(d_partial < d_disjoint, "{d_partial} !< {d_disjoint}");
        assert!((d_exact - 0.0).abs() < f64::EPSILON);
        assert!((d_disjoint - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_candidate_is_maximally_distant() {
        let scorer = TokenOverlapScorer;
        let empty = candidate("", 1);
        assert!((scorer.distance("anything", &empty) - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn non_positive_limit_is_invalid() {
        let db = Database::open_in_memory().await.unwrap();
        let query = SearchQuery::text("anything");

        for limit in [0, -3] {
            let err = engine()
                .search(&db, "s1", &query, limit)
                .await
                .unwrap_err();
            assert!(matches!(err, EngramError::InvalidArgument(_)));
        }
    }

    #[tokio::test]
    async fn empty_query_text_is_invalid() {
        let db = Database::open_in_memory().await.unwrap();
        let err = engine()
            .search(&db, "s1", &SearchQuery::text("   "), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, EngramError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn results_are_ascending_in_distance_and_capped() {
        let db = Database::open_in_memory().await.unwrap();
        messages::append_messages(
            &db,
            "s1",
            vec![
                draft("rust borrow checker rules"),
                draft("cooking pasta tonight"),
                draft("the borrow checker again"),
                draft("rust ownership and borrowing"),
            ],
        )
        .await
        .unwrap();

        let results = engine()
            .search(&db, "s1", &SearchQuery::text("borrow checker"), 2)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].dist <= results[1].dist);
        assert_eq!(results[0].message.content, "the borrow checker again");
    }

    #[tokio::test]
    async fn ties_are_broken_by_recency() {
        let db = Database::open_in_memory().await.unwrap();
        messages::append_messages(
            &db,
            "s1",
            vec![draft("identical words"), draft("identical words")],
        )
        .await
        .unwrap();

        let results = engine()
            .search(&db, "s1", &SearchQuery::text("identical words"), 10)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(
            results[0].message.sequence > results[1].message.sequence,
            "equal distances must put the newer message first"
        );
    }

    #[tokio::test]
    async fn metadata_filter_is_exact_match_on_every_pair() {
        let db = Database::open_in_memory().await.unwrap();
        let stored = messages::append_messages(
            &db,
            "s1",
            vec![draft("rust talk"), draft("rust talk"), draft("rust talk")],
        )
        .await
        .unwrap();

        metadata::upsert_metadata_batch(
            &db,
            "s1",
            vec![
                MessageMetadata {
                    message_id: stored[0].id.clone(),
                    key: "lang".to_string(),
                    value: Some(json!("rust")),
                },
                MessageMetadata {
                    message_id: stored[0].id.clone(),
                    key: "kind".to_string(),
                    value: Some(json!("talk")),
                },
                MessageMetadata {
                    message_id: stored[1].id.clone(),
                    key: "lang".to_string(),
                    value: Some(json!("go")),
                },
            ],
        )
        .await
        .unwrap();

        let mut filter = std::collections::HashMap::new();
        filter.insert("lang".to_string(), json!("rust"));
        filter.insert("kind".to_string(), json!("talk"));
        let query = SearchQuery {
            text: "rust".to_string(),
            metadata: Some(filter),
        };

        let results = engine().search(&db, "s1", &query, 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].message.id, stored[0].id);
        // The hit carries its metadata snapshot.
        let meta = results[0].metadata.as_ref().unwrap();
        assert_eq!(meta["lang"], json!("rust"));
    }

    #[tokio::test]
    async fn filtering_and_metadata_attachment_share_one_snapshot() {
        let db = Database::open_in_memory().await.unwrap();
        let stored = messages::append_messages(
            &db,
            "s1",
            vec![draft("rust notes"), draft("rust notes"), draft("rust notes")],
        )
        .await
        .unwrap();

        // Every message carries metadata, so the filter pass reads entries
        // for candidates the hit pass later takes out of the snapshot.
        metadata::upsert_metadata_batch(
            &db,
            "s1",
            stored
                .iter()
                .enumerate()
                .map(|(i, m)| MessageMetadata {
                    message_id: m.id.clone(),
                    key: "rank".to_string(),
                    value: Some(json!(i as i64)),
                })
                .collect(),
        )
        .await
        .unwrap();

        let mut filter = std::collections::HashMap::new();
        filter.insert("rank".to_string(), json!(1));
        let query = SearchQuery {
            text: "rust".to_string(),
            metadata: Some(filter),
        };

        let results = engine().search(&db, "s1", &query, 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].message.id, stored[1].id);
        assert_eq!(results[0].metadata.as_ref().unwrap()["rank"], json!(1));
    }

    #[tokio::test]
    async fn empty_filter_imposes_no_restriction() {
        let db = Database::open_in_memory().await.unwrap();
        messages::append_messages(&db, "s1", vec![draft("alpha beta"), draft("beta gamma")])
            .await
            .unwrap();

        let query = SearchQuery {
            text: "beta".to_string(),
            metadata: Some(std::collections::HashMap::new()),
        };
        let results = engine().search(&db, "s1", &query, 10).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn limit_is_clamped_to_the_configured_maximum() {
        let db = Database::open_in_memory().await.unwrap();
        let drafts = (0..5).map(|i| draft(&format!("common term {i}"))).collect();
        messages::append_messages(&db, "s1", drafts).await.unwrap();

        let capped = SearchEngine::new(Arc::new(TokenOverlapScorer), 3);
        let results = capped
            .search(&db, "s1", &SearchQuery::text("common term"), 1000)
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
    }
}
