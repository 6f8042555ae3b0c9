//! Keyword search over stored records.
//!
//! Scoring is an explicit keyword/substring heuristic, not semantic
//! similarity: each query token found as a substring of a record's
//! lowercased content scores 1, and on the graph backend a token whose
//! entity node links directly to the record scores 1 more. Zero-scoring
//! records are excluded; ties break by recency (newer `created_at`
//! first).

use std::collections::HashSet;

use crate::config::SearchConfig;
use crate::memory::MemoryRecord;
use crate::store::MemoryStore;
use crate::types::{MemoryId, MemoryKind};

/// The search engine that ranks records for a query.
#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    config: SearchConfig,
}

impl SearchEngine {
    /// Create a search engine with the given configuration.
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    /// The configured default result cap.
    #[must_use]
    pub fn default_limit(&self) -> usize {
        self.config.default_limit
    }

    /// Rank records by keyword relevance to `query`, optionally filtered
    /// to one kind, capped at `limit`.
    #[must_use]
    pub fn search(
        &self,
        store: &MemoryStore,
        query: &str,
        category: Option<MemoryKind>,
        limit: usize,
    ) -> Vec<MemoryRecord> {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return Vec::new();
        }

        // One entity lookup per token, shared across all candidates.
        let entity_hits: Vec<HashSet<MemoryId>> = tokens
            .iter()
            .map(|token| store.entity_links(token).into_iter().collect())
            .collect();

        let mut scored: Vec<(usize, &MemoryRecord)> = store
            .records()
            .iter()
            .filter(|record| category.is_none_or(|kind| record.kind() == kind))
            .filter_map(|record| {
                let content = record.content().to_lowercase();
                let id = record.id();
                let score: usize = tokens
                    .iter()
                    .zip(&entity_hits)
                    .map(|(token, hits)| {
                        usize::from(content.contains(token.as_str()))
                            + usize::from(hits.contains(&id))
                    })
                    .sum();
                (score > 0).then_some((score, record))
            })
            .collect();

        scored.sort_by(|(score_a, rec_a), (score_b, rec_b)| {
            score_b
                .cmp(score_a)
                .then_with(|| rec_b.created_at().cmp(&rec_a.created_at()))
        });
        scored.truncate(limit);
        scored.into_iter().map(|(_, record)| record.clone()).collect()
    }

    /// All records mentioning `entity`: the union of content substring
    /// matches and graph-linked records within the configured hop depth.
    /// Both backends honor this; the flat file simply contributes no
    /// graph links.
    #[must_use]
    pub fn find_related(&self, store: &MemoryStore, entity: &str) -> Vec<MemoryRecord> {
        let linked: HashSet<MemoryId> = store
            .related_ids(entity, self.config.related_depth)
            .into_iter()
            .collect();
        let needle = entity.to_lowercase();

        store
            .records()
            .iter()
            .filter(|record| {
                linked.contains(&record.id())
                    || record.content().to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }
}

/// Lowercase query tokens, punctuation trimmed, empties dropped.
fn tokenize(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation()).to_string())
        .filter(|w| !w.is_empty())
        .collect()
}
