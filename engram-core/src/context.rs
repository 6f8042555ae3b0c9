//! Context assembly — turning stored records into a prompt-ready block.
//!
//! Output is deterministic for a fixed store snapshot and query, and the
//! section headers are a stable contract: downstream tooling pastes the
//! result verbatim into prompts. No token-budget truncation happens here
//! beyond the requested counts; that is the caller's concern.

use crate::config::ContextConfig;
use crate::memory::MemoryRecord;
use crate::search::SearchEngine;
use crate::store::MemoryStore;
use crate::types::MemoryKind;

/// Assembles a size-bounded context block from the most relevant records.
#[derive(Debug, Clone, Default)]
pub struct ContextAssembler {
    config: ContextConfig,
}

impl ContextAssembler {
    /// Create a context assembler with the given configuration.
    #[must_use]
    pub fn new(config: ContextConfig) -> Self {
        Self { config }
    }

    /// Build a context block with the configured default limits.
    #[must_use]
    pub fn build_default(
        &self,
        store: &MemoryStore,
        engine: &SearchEngine,
        query: &str,
    ) -> String {
        self.build_context(
            store,
            engine,
            query,
            self.config.max_facts,
            self.config.max_episodes,
            self.config.include_procedures,
        )
    }

    /// Build a context block for `query`.
    ///
    /// Sections, each omitted when empty, joined by blank lines:
    /// `Facts:` (top semantic matches, or category heads for an empty
    /// query), `Recent Experiences:` (episodic matches, or most recent
    /// episodes for an empty query), and `Relevant Procedures:`
    /// (procedures whose name or `trigger` metadata matches a query
    /// token, or all of them for an empty query).
    #[must_use]
    pub fn build_context(
        &self,
        store: &MemoryStore,
        engine: &SearchEngine,
        query: &str,
        max_facts: usize,
        max_episodes: usize,
        include_procedures: bool,
    ) -> String {
        let mut sections: Vec<String> = Vec::new();

        let facts: Vec<MemoryRecord> = if query.trim().is_empty() {
            store
                .get_by_category(MemoryKind::Semantic)
                .into_iter()
                .take(max_facts)
                .cloned()
                .collect()
        } else {
            engine.search(store, query, Some(MemoryKind::Semantic), max_facts)
        };
        if !facts.is_empty() {
            let lines: Vec<String> =
                facts.iter().map(|m| format!("- {}", m.content())).collect();
            sections.push(format!("Facts:\n{}", lines.join("\n")));
        }

        let episodes: Vec<MemoryRecord> = if query.trim().is_empty() {
            store
                .get_recent_episodes(max_episodes)
                .into_iter()
                .cloned()
                .collect()
        } else {
            engine.search(store, query, Some(MemoryKind::Episodic), max_episodes)
        };
        if !episodes.is_empty() {
            let lines: Vec<String> = episodes
                .iter()
                .map(|m| {
                    let date = m
                        .occurred_at()
                        .map(|t| t.format("%Y-%m-%d").to_string())
                        .unwrap_or_default();
                    format!("- [{date}] {}", m.content())
                })
                .collect();
            sections.push(format!("Recent Experiences:\n{}", lines.join("\n")));
        }

        if include_procedures {
            let procedures = relevant_procedures(store, query);
            if !procedures.is_empty() {
                let blocks: Vec<String> = procedures
                    .iter()
                    .map(|m| m.content().to_string())
                    .collect();
                sections.push(format!("Relevant Procedures:\n{}", blocks.join("\n\n")));
            }
        }

        sections.join("\n\n")
    }
}

/// Procedures whose name or `trigger` metadata matches a query token; all
/// procedures when the query is empty.
fn relevant_procedures<'a>(store: &'a MemoryStore, query: &str) -> Vec<&'a MemoryRecord> {
    let procedures = store.get_by_category(MemoryKind::Procedural);
    let tokens: Vec<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation()).to_string())
        .filter(|w| !w.is_empty())
        .collect();
    if tokens.is_empty() {
        return procedures;
    }

    procedures
        .into_iter()
        .filter(|record| {
            let name = record.procedure_name().unwrap_or_default().to_lowercase();
            let trigger = record
                .metadata()
                .get("trigger")
                .map(|t| t.to_lowercase())
                .unwrap_or_default();
            tokens
                .iter()
                .any(|token| name.contains(token) || trigger.contains(token))
        })
        .collect()
}
