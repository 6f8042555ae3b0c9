//! Property-based tests for the memory store.
//!
//! Uses `proptest` to verify structural invariants under random record
//! sets: category partitioning, persistence round trips, search result
//! relevance, and entity extraction hygiene.

use proptest::prelude::*;

use engram_core::backend::graph::extract_entities;
use engram_core::backend::{GraphBackend, JsonBackend, StorageBackend};
use engram_core::memory::{EpisodicMemory, MemoryRecord, SemanticMemory};
use engram_core::{MemoryKind, MemoryStore, Metadata, SearchEngine};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_content() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9 ]{0,40}"
}

fn arb_record() -> impl Strategy<Value = MemoryRecord> {
    prop_oneof![
        arb_content().prop_map(|c| MemoryRecord::Semantic(SemanticMemory::new(
            c,
            Metadata::new()
        ))),
        arb_content().prop_map(|c| MemoryRecord::Episodic(EpisodicMemory::new(
            c,
            None,
            Metadata::new()
        ))),
    ]
}

fn store_with(records: &[MemoryRecord]) -> MemoryStore {
    let backend = GraphBackend::open_in_memory().expect("backend");
    let mut store = MemoryStore::with_backend(Box::new(backend)).expect("store");
    for record in records {
        match record {
            MemoryRecord::Semantic(m) => {
                store.add_fact(m.content.clone(), m.metadata.clone()).expect("add");
            }
            MemoryRecord::Episodic(m) => {
                store
                    .add_episode(m.content.clone(), Some(m.occurred_at), m.metadata.clone())
                    .expect("add");
            }
            MemoryRecord::Procedural(_) => unreachable!("not generated"),
        }
    }
    store
}

// ---------------------------------------------------------------------------
// Property: category views partition the store and keep insertion order
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn categories_partition_the_store(records in prop::collection::vec(arb_record(), 0..20)) {
        let store = store_with(&records);

        let semantic = store.get_by_category(MemoryKind::Semantic).len();
        let episodic = store.get_by_category(MemoryKind::Episodic).len();
        let procedural = store.get_by_category(MemoryKind::Procedural).len();
        prop_assert_eq!(semantic + episodic + procedural, store.records().len());

        let stats = store.stats();
        prop_assert_eq!(stats.semantic, semantic);
        prop_assert_eq!(stats.episodic, episodic);
        prop_assert_eq!(stats.total, records.len());

        // Per-category views preserve overall insertion order.
        let expected: Vec<&str> = store
            .records()
            .iter()
            .filter(|r| r.kind() == MemoryKind::Semantic)
            .map(MemoryRecord::content)
            .collect();
        let got: Vec<&str> = store
            .get_by_category(MemoryKind::Semantic)
            .iter()
            .map(|r| r.content())
            .collect();
        prop_assert_eq!(expected, got);
    }
}

// ---------------------------------------------------------------------------
// Property: flat-file persistence round-trips any record set exactly
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn json_round_trip_preserves_records(records in prop::collection::vec(arb_record(), 0..20)) {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut backend = JsonBackend::open(dir.path()).expect("backend");
        backend.persist(&records).expect("persist");

        let reopened = JsonBackend::open(dir.path()).expect("reopen");
        prop_assert_eq!(reopened.load_all().expect("load"), records);
    }
}

// ---------------------------------------------------------------------------
// Property: search never returns a record sharing no token with the query
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn search_hits_share_a_token_with_the_query(
        records in prop::collection::vec(arb_record(), 0..15),
        query in "[a-zA-Z]{1,8}( [a-zA-Z]{1,8}){0,2}",
    ) {
        let store = store_with(&records);
        let engine = SearchEngine::default();

        let tokens: Vec<String> = query
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        for hit in engine.search(&store, &query, None, 50) {
            let content = hit.content().to_lowercase();
            let entity_hit = tokens
                .iter()
                .any(|t| store.entity_links(t).contains(&hit.id()));
            prop_assert!(
                tokens.iter().any(|t| content.contains(t)) || entity_hit,
                "hit {:?} shares nothing with query {:?}",
                hit.content(),
                query
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Property: recent episodes are capped and sorted newest-first
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn recent_episodes_capped_and_descending(
        records in prop::collection::vec(arb_record(), 0..20),
        limit in 0usize..10,
    ) {
        let store = store_with(&records);
        let recent = store.get_recent_episodes(limit);

        prop_assert!(recent.len() <= limit);
        prop_assert!(recent.iter().all(|r| r.kind() == MemoryKind::Episodic));
        for pair in recent.windows(2) {
            prop_assert!(pair[0].occurred_at() >= pair[1].occurred_at());
        }
    }
}

// ---------------------------------------------------------------------------
// Property: extracted entities are nonempty, deduped, and drawn from the text
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn extracted_entities_are_clean(content in ".{0,80}") {
        let entities = extract_entities(&content);

        let mut seen = std::collections::HashSet::new();
        for entity in &entities {
            prop_assert!(!entity.trim().is_empty());
            prop_assert!(seen.insert(entity.to_lowercase()), "duplicate {entity:?}");
            prop_assert!(
                content.contains(entity.as_str()),
                "entity {entity:?} not present in {content:?}"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Property: delete removes exactly the targeted record
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn delete_removes_exactly_one(
        records in prop::collection::vec(arb_record(), 1..15),
        pick in 0usize..15,
    ) {
        let mut store = store_with(&records);
        let idx = pick % store.records().len();
        let id = store.records()[idx].id();

        prop_assert!(store.delete(id).expect("delete"));
        prop_assert_eq!(store.records().len(), records.len() - 1);
        prop_assert!(store.records().iter().all(|r| r.id() != id));
        prop_assert!(!store.delete(id).expect("second delete"));
    }
}
