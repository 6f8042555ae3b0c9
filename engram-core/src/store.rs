//! The memory store — record creation, identity, update semantics, and
//! delegation of durability to a storage backend.
//!
//! Every mutating call persists the full updated record set synchronously
//! before returning; on persist failure the in-memory change is rolled
//! back, so the store and the disk never diverge and a crash after a
//! successful call cannot lose that call's effect.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::backend::{self, StorageBackend};
use crate::config::EngramConfig;
use crate::context::ContextAssembler;
use crate::error::{EngramError, Result};
use crate::memory::{EpisodicMemory, MemoryRecord, ProceduralMemory, SemanticMemory};
use crate::search::SearchEngine;
use crate::types::{BackendKind, MemoryId, MemoryKind, Metadata, StoreStats};

/// Everything the store knows about one entity: the records that mention
/// it plus co-mentioned entities (graph backend only; empty on flat file).
#[derive(Debug, Clone, Default)]
pub struct EntityReport {
    /// Records mentioning the entity.
    pub memories: Vec<MemoryRecord>,
    /// Other entities co-mentioned with it, lowercase.
    pub related_entities: Vec<String>,
}

/// Long-term memory with three kinds: semantic facts, episodic
/// experiences, and procedural workflows.
///
/// Construct one explicitly with [`MemoryStore::open`] (backend chosen by
/// configuration, with graph→flat-file fallback) or
/// [`MemoryStore::with_backend`], and pass it by reference into whatever
/// adapter layer wraps it.
pub struct MemoryStore {
    backend: Box<dyn StorageBackend>,
    records: Vec<MemoryRecord>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("backend", &self.backend.kind())
            .field("records", &self.records.len())
            .finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// Open a store on the backend named by `config`, loading all
    /// persisted records.
    ///
    /// # Errors
    /// Returns an error when no backend can be opened at all; graph
    /// unavailability alone falls back to the flat file.
    pub fn open(config: &EngramConfig) -> Result<Self> {
        let backend = backend::open_backend(&config.storage)?;
        Self::with_backend(backend)
    }

    /// Open a store on an already-constructed backend.
    ///
    /// # Errors
    /// Returns an error if the backend cannot load its records.
    pub fn with_backend(backend: Box<dyn StorageBackend>) -> Result<Self> {
        let records = backend.load_all()?;
        info!(
            count = records.len(),
            backend = %backend.kind(),
            "memory store opened"
        );
        Ok(Self { backend, records })
    }

    /// Which backend is actually in use (fallback is observable here).
    #[must_use]
    pub fn active_backend(&self) -> BackendKind {
        self.backend.kind()
    }

    /// All records, in insertion order.
    #[must_use]
    pub fn records(&self) -> &[MemoryRecord] {
        &self.records
    }

    /// Records with pagination: skip `offset`, cap at `limit` when given.
    #[must_use]
    pub fn get_memories(&self, offset: usize, limit: Option<usize>) -> &[MemoryRecord] {
        let start = offset.min(self.records.len());
        let slice = &self.records[start..];
        match limit {
            Some(n) => &slice[..n.min(slice.len())],
            None => slice,
        }
    }

    fn persist(&mut self) -> Result<()> {
        self.backend.persist(&self.records)
    }

    fn insert(&mut self, record: MemoryRecord) -> Result<MemoryRecord> {
        self.records.push(record.clone());
        if let Err(e) = self.persist() {
            self.records.pop();
            return Err(e);
        }
        debug!(id = %record.id(), kind = %record.kind(), "memory added");
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Semantic memory (facts)
    // ------------------------------------------------------------------

    /// Add a fact. No dedup is applied; contradiction handling is
    /// [`MemoryStore::update_fact`]'s job.
    ///
    /// # Errors
    /// Returns an error if persistence fails (the fact is then not added).
    pub fn add_fact(
        &mut self,
        content: impl Into<String>,
        metadata: Metadata,
    ) -> Result<MemoryRecord> {
        self.insert(MemoryRecord::Semantic(SemanticMemory::new(
            content, metadata,
        )))
    }

    /// Rewrite the existing fact matching `old_text` to say `new_text`,
    /// keeping its identity and bumping its update timestamp.
    ///
    /// Matching is a case-insensitive substring test over semantic
    /// content; when several facts match, the most recently updated one
    /// wins. This keeps the fact count stable when knowledge changes
    /// ("brother changed jobs") instead of accumulating contradictions.
    ///
    /// # Errors
    /// Returns [`EngramError::NoMatchingFact`] when nothing matches, or a
    /// persistence error (the fact is then left unchanged).
    pub fn update_fact(
        &mut self,
        old_text: &str,
        new_text: impl Into<String>,
    ) -> Result<MemoryRecord> {
        let needle = old_text.to_lowercase();
        let idx = self
            .records
            .iter()
            .enumerate()
            .filter_map(|(i, record)| match record {
                MemoryRecord::Semantic(fact)
                    if fact.content.to_lowercase().contains(&needle) =>
                {
                    Some((i, fact.updated_at))
                }
                _ => None,
            })
            .max_by_key(|&(_, updated_at)| updated_at)
            .map(|(i, _)| i)
            .ok_or_else(|| EngramError::NoMatchingFact(old_text.to_string()))?;

        let snapshot = self.records[idx].clone();
        if let MemoryRecord::Semantic(fact) = &mut self.records[idx] {
            fact.rewrite(new_text);
        }
        if let Err(e) = self.persist() {
            self.records[idx] = snapshot;
            return Err(e);
        }
        debug!(id = %self.records[idx].id(), "fact rewritten");
        Ok(self.records[idx].clone())
    }

    /// Like [`MemoryStore::update_fact`], but a miss inserts `new_text`
    /// as a fresh fact instead of failing.
    ///
    /// # Errors
    /// Returns an error if persistence fails.
    pub fn upsert_fact(&mut self, old_text: &str, new_text: &str) -> Result<MemoryRecord> {
        match self.update_fact(old_text, new_text) {
            Err(EngramError::NoMatchingFact(_)) => self.add_fact(new_text, Metadata::new()),
            other => other,
        }
    }

    // ------------------------------------------------------------------
    // Episodic memory (experiences)
    // ------------------------------------------------------------------

    /// Add a timestamped experience. The event time defaults to now when
    /// `occurred_at` is `None`.
    ///
    /// # Errors
    /// Returns an error if persistence fails.
    pub fn add_episode(
        &mut self,
        content: impl Into<String>,
        occurred_at: Option<DateTime<Utc>>,
        metadata: Metadata,
    ) -> Result<MemoryRecord> {
        self.insert(MemoryRecord::Episodic(EpisodicMemory::new(
            content,
            occurred_at,
            metadata,
        )))
    }

    /// Episodic records ordered by event time descending, capped at
    /// `limit`.
    #[must_use]
    pub fn get_recent_episodes(&self, limit: usize) -> Vec<&MemoryRecord> {
        let mut episodes: Vec<&MemoryRecord> = self
            .records
            .iter()
            .filter(|r| r.kind() == MemoryKind::Episodic)
            .collect();
        episodes.sort_by_key(|r| std::cmp::Reverse(r.occurred_at()));
        episodes.truncate(limit);
        episodes
    }

    // ------------------------------------------------------------------
    // Procedural memory (workflows)
    // ------------------------------------------------------------------

    /// Add a workflow, or — when a procedure with this name already
    /// exists — replace that procedure's steps in place and merge the
    /// supplied metadata. Never creates a duplicate by name.
    ///
    /// # Errors
    /// Returns an error if persistence fails.
    pub fn add_procedure(
        &mut self,
        name: &str,
        steps: Vec<String>,
        metadata: Metadata,
    ) -> Result<MemoryRecord> {
        let existing = self
            .records
            .iter()
            .position(|r| r.procedure_name() == Some(name));

        let Some(idx) = existing else {
            return self.insert(MemoryRecord::Procedural(ProceduralMemory::new(
                name, steps, metadata,
            )));
        };

        let snapshot = self.records[idx].clone();
        if let MemoryRecord::Procedural(proc) = &mut self.records[idx] {
            proc.replace_steps(steps);
            proc.metadata.extend(metadata);
        }
        if let Err(e) = self.persist() {
            self.records[idx] = snapshot;
            return Err(e);
        }
        debug!(name, "procedure replaced");
        Ok(self.records[idx].clone())
    }

    /// Look up a procedure by name.
    ///
    /// # Errors
    /// Returns [`EngramError::ProcedureNotFound`] when no procedure has
    /// that name.
    pub fn get_procedure(&self, name: &str) -> Result<&MemoryRecord> {
        self.records
            .iter()
            .find(|r| r.procedure_name() == Some(name))
            .ok_or_else(|| EngramError::ProcedureNotFound(name.to_string()))
    }

    // ------------------------------------------------------------------
    // Retrieval helpers
    // ------------------------------------------------------------------

    /// All records of one kind, in insertion order.
    #[must_use]
    pub fn get_by_category(&self, kind: MemoryKind) -> Vec<&MemoryRecord> {
        self.records.iter().filter(|r| r.kind() == kind).collect()
    }

    /// IDs of records whose graph entity node matches `token`. Empty on
    /// the flat-file backend.
    #[must_use]
    pub fn entity_links(&self, token: &str) -> Vec<MemoryId> {
        self.backend.entity_links(token)
    }

    /// IDs of records within `depth` relationship hops of `entity`.
    /// Empty on the flat-file backend.
    #[must_use]
    pub fn related_ids(&self, entity: &str, depth: u32) -> Vec<MemoryId> {
        self.backend.related_ids(entity, depth)
    }

    /// Everything known about an entity. On the graph backend this walks
    /// mention edges; on the flat file it degrades to a substring scan
    /// over content (capped at 20 records) with no related entities.
    #[must_use]
    pub fn entity_info(&self, entity: &str) -> EntityReport {
        let info = self.backend.entity_info(entity);
        if info.memory_ids.is_empty() && info.related_entities.is_empty() {
            let needle = entity.to_lowercase();
            let memories: Vec<MemoryRecord> = self
                .records
                .iter()
                .filter(|r| r.content().to_lowercase().contains(&needle))
                .take(20)
                .cloned()
                .collect();
            return EntityReport {
                memories,
                related_entities: Vec::new(),
            };
        }
        let memories = self
            .records
            .iter()
            .filter(|r| info.memory_ids.contains(&r.id()))
            .cloned()
            .collect();
        EntityReport {
            memories,
            related_entities: info.related_entities,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Delete a record by ID. Returns `true` when a record existed and
    /// was removed.
    ///
    /// # Errors
    /// Returns an error if persistence fails (the record is then kept).
    pub fn delete(&mut self, id: MemoryId) -> Result<bool> {
        let Some(idx) = self.records.iter().position(|r| r.id() == id) else {
            return Ok(false);
        };
        let removed = self.records.remove(idx);
        if let Err(e) = self.persist() {
            self.records.insert(idx, removed);
            return Err(e);
        }
        debug!(%id, "memory deleted");
        Ok(true)
    }

    /// Remove every record.
    ///
    /// # Errors
    /// Returns an error if persistence fails (records are then kept).
    pub fn clear_all(&mut self) -> Result<()> {
        let snapshot = std::mem::take(&mut self.records);
        if let Err(e) = self.persist() {
            self.records = snapshot;
            return Err(e);
        }
        info!("memory store cleared");
        Ok(())
    }

    /// Per-kind counts plus the active backend.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let mut stats = StoreStats {
            total: self.records.len(),
            semantic: 0,
            episodic: 0,
            procedural: 0,
            backend: self.active_backend(),
        };
        for record in &self.records {
            match record.kind() {
                MemoryKind::Semantic => stats.semantic += 1,
                MemoryKind::Episodic => stats.episodic += 1,
                MemoryKind::Procedural => stats.procedural += 1,
            }
        }
        stats
    }

    /// Serialize all records into the prompt-ready text block, grouped by
    /// kind. Stable output contract: downstream tooling pastes this
    /// verbatim into prompts.
    #[must_use]
    pub fn export_for_prompt(&self) -> String {
        ContextAssembler::default().build_context(self, &SearchEngine::default(), "", 50, 20, true)
    }
}
