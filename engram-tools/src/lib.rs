//! Tool-operation surface for the engram memory system.
//!
//! A [`MemoryToolkit`] wraps one [`MemoryStore`] plus the search and
//! context components and exposes the eight memory operations a tool host
//! (an MCP-style server) wraps one-to-one:
//!
//! | Tool name              | Method                          |
//! |------------------------|---------------------------------|
//! | `memory_add_fact`      | [`MemoryToolkit::add_fact`]     |
//! | `memory_add_episode`   | [`MemoryToolkit::add_episode`]  |
//! | `memory_add_procedure` | [`MemoryToolkit::add_procedure`]|
//! | `memory_search`        | [`MemoryToolkit::search`]       |
//! | `memory_get_context`   | [`MemoryToolkit::get_context`]  |
//! | `memory_stats`         | [`MemoryToolkit::stats`]        |
//! | `memory_list_all`      | [`MemoryToolkit::list_all`]     |
//! | `memory_delete`        | [`MemoryToolkit::delete`]       |
//!
//! Every method returns a human-readable text payload; the wire protocol
//! of the host process is out of scope here.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::fmt::Write as _;

use tracing::debug;

use engram_core::error::Result;
use engram_core::{
    ContextAssembler, EngramConfig, MemoryId, MemoryKind, MemoryStore, SearchEngine,
};

/// One memory store plus its retrieval components, exposed as tool-shaped
/// operations returning text payloads.
#[derive(Debug)]
pub struct MemoryToolkit {
    store: MemoryStore,
    engine: SearchEngine,
    assembler: ContextAssembler,
}

impl MemoryToolkit {
    /// Open a toolkit on the backend named by `config`.
    ///
    /// # Errors
    /// Returns an error when no backend can be opened at all.
    pub fn open(config: &EngramConfig) -> Result<Self> {
        Ok(Self {
            store: MemoryStore::open(config)?,
            engine: SearchEngine::new(config.search.clone()),
            assembler: ContextAssembler::new(config.context.clone()),
        })
    }

    /// Wrap an already-open store with default search and context
    /// settings.
    #[must_use]
    pub fn with_store(store: MemoryStore) -> Self {
        Self {
            store,
            engine: SearchEngine::default(),
            assembler: ContextAssembler::default(),
        }
    }

    /// Direct access to the underlying store.
    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// `memory_add_fact` — add a semantic memory, with optional
    /// comma-separated tags.
    ///
    /// # Errors
    /// Returns an error if persistence fails.
    pub fn add_fact(&mut self, fact: &str, tags: Option<&str>) -> Result<String> {
        let mut metadata = engram_core::Metadata::new();
        if let Some(tags) = tags {
            metadata.insert("tags".to_string(), tags.trim().to_string());
        }
        let record = self.store.add_fact(fact, metadata)?;
        debug!(id = %record.id(), "tool added fact");
        Ok(format!("Saved fact (ID: {})", record.id()))
    }

    /// `memory_add_episode` — add an episodic memory, with optional
    /// topic.
    ///
    /// # Errors
    /// Returns an error if persistence fails.
    pub fn add_episode(&mut self, summary: &str, topic: Option<&str>) -> Result<String> {
        let mut metadata = engram_core::Metadata::new();
        if let Some(topic) = topic {
            metadata.insert("topic".to_string(), topic.to_string());
        }
        let record = self.store.add_episode(summary, None, metadata)?;
        Ok(format!("Saved episode (ID: {})", record.id()))
    }

    /// `memory_add_procedure` — add (or replace, by name) a procedural
    /// memory, with optional trigger description.
    ///
    /// # Errors
    /// Returns an error if persistence fails.
    pub fn add_procedure(
        &mut self,
        name: &str,
        steps: &[String],
        trigger: Option<&str>,
    ) -> Result<String> {
        let mut metadata = engram_core::Metadata::new();
        if let Some(trigger) = trigger {
            metadata.insert("trigger".to_string(), trigger.to_string());
        }
        self.store.add_procedure(name, steps.to_vec(), metadata)?;
        Ok(format!("Saved procedure '{name}'"))
    }

    /// `memory_search` — keyword search, optionally filtered by kind.
    #[must_use]
    pub fn search(&self, query: &str, category: Option<MemoryKind>, limit: Option<usize>) -> String {
        let limit = limit.unwrap_or_else(|| self.engine.default_limit());
        let results = self.engine.search(&self.store, query, category, limit);
        if results.is_empty() {
            return "No memories found".to_string();
        }
        let mut out = format!("Found {} memories:\n", results.len());
        for record in &results {
            let _ = write!(
                out,
                "\n[{}] {}\n  ID: {}\n",
                record.kind(),
                record.content(),
                record.id()
            );
        }
        out
    }

    /// `memory_get_context` — build a context block for a topic.
    #[must_use]
    pub fn get_context(&self, topic: &str) -> String {
        let context = self.assembler.build_default(&self.store, &self.engine, topic);
        if context.is_empty() {
            "No relevant memories".to_string()
        } else {
            context
        }
    }

    /// `memory_stats` — per-kind counts and the active backend.
    #[must_use]
    pub fn stats(&self) -> String {
        self.store.stats().to_string()
    }

    /// `memory_list_all` — list every record, optionally one kind only.
    #[must_use]
    pub fn list_all(&self, category: Option<MemoryKind>) -> String {
        let records: Vec<_> = match category {
            Some(kind) => self.store.get_by_category(kind),
            None => self.store.records().iter().collect(),
        };
        if records.is_empty() {
            return "No memories".to_string();
        }
        let mut out = format!("{} memories:\n", records.len());
        for record in records {
            let content = record.content();
            let short: String = content.chars().take(80).collect();
            let ellipsis = if content.chars().count() > 80 { "…" } else { "" };
            let _ = write!(
                out,
                "\n[{}] {short}{ellipsis}\n  ID: {}\n",
                record.kind(),
                record.id()
            );
        }
        out
    }

    /// `memory_delete` — delete a record by its ID string.
    ///
    /// # Errors
    /// Returns an error if persistence fails; an unknown or malformed ID
    /// is reported in the payload, not as an error.
    pub fn delete(&mut self, memory_id: &str) -> Result<String> {
        let Some(id) = MemoryId::parse(memory_id) else {
            return Ok(format!("Not found: {memory_id}"));
        };
        if self.store.delete(id)? {
            Ok(format!("Deleted {id}"))
        } else {
            Ok(format!("Not found: {id}"))
        }
    }
}
