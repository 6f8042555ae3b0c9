//! Relationship-graph backend over SQLite.
//!
//! Records are stored as JSON blobs alongside an entity-mention edge
//! table:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS memories (
//!     id         TEXT PRIMARY KEY,
//!     kind       TEXT NOT NULL,
//!     data       BLOB NOT NULL,
//!     created_at TEXT NOT NULL
//! );
//! CREATE TABLE IF NOT EXISTS mentions (
//!     memory_id  TEXT NOT NULL,
//!     entity     TEXT NOT NULL,
//!     PRIMARY KEY (memory_id, entity)
//! );
//! ```
//!
//! Entities are extracted from record content on every persist (quoted
//! strings plus capitalized words, minus a stop-list), giving
//! `(memory) -[mentions]-> (entity)` edges that power entity search
//! boosts, `find_related` traversal, and entity summaries. JSON inside a
//! BLOB column keeps the schema stable across record-shape changes.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, params};
use tracing::{debug, info, warn};

use crate::backend::{EntityInfo, StorageBackend};
use crate::error::{EngramError, Result};
use crate::memory::MemoryRecord;
use crate::types::{BackendKind, MemoryId};

/// Capitalized words skipped during entity extraction: sentence starters
/// and self-references, not names.
const ENTITY_STOPLIST: &[&str] = &["the", "a", "an", "this", "that", "user", "i"];

/// Relationship-graph storage backend.
pub struct GraphBackend {
    conn: Connection,
    db_path: PathBuf,
}

impl std::fmt::Debug for GraphBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphBackend")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl GraphBackend {
    /// Open (or create) the graph database under `<dir>/graph/`.
    ///
    /// # Errors
    /// Returns [`EngramError::Io`] if the directory cannot be created, or
    /// [`EngramError::Database`] on SQLite failures — callers treat either
    /// as "backend unavailable" and fall back to the flat file.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let graph_dir = dir.as_ref().join("graph");
        std::fs::create_dir_all(&graph_dir)?;
        let db_path = graph_dir.join("memories.db");

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&db_path, flags)?;

        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        Self::init_schema(&conn)?;

        info!(path = %db_path.display(), "graph backend opened");
        Ok(Self { conn, db_path })
    }

    /// Open an in-memory graph database (useful for tests).
    ///
    /// # Errors
    /// Returns [`EngramError::Database`] on SQLite failures.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn,
            db_path: PathBuf::from(":memory:"),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS memories (
                id         TEXT PRIMARY KEY,
                kind       TEXT NOT NULL,
                data       BLOB NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS mentions (
                memory_id  TEXT NOT NULL,
                entity     TEXT NOT NULL,
                PRIMARY KEY (memory_id, entity)
            );
            CREATE INDEX IF NOT EXISTS idx_mentions_entity ON mentions(entity);",
        )?;
        Ok(())
    }

    /// Path to the database file (or `:memory:`).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn query_ids(&self, sql: &str, param: &str) -> Vec<MemoryId> {
        let mut ids = Vec::new();
        let Ok(mut stmt) = self.conn.prepare_cached(sql) else {
            return ids;
        };
        let rows = stmt.query_map(params![param], |row| row.get::<_, String>(0));
        let Ok(rows) = rows else {
            return ids;
        };
        for row in rows.flatten() {
            match MemoryId::parse(&row) {
                Some(id) => ids.push(id),
                None => warn!(id = %row, "skipping row with invalid memory ID"),
            }
        }
        ids
    }

    /// Entities mentioned by a given record.
    fn entities_of(&self, id: MemoryId) -> Vec<String> {
        let mut entities = Vec::new();
        let Ok(mut stmt) = self
            .conn
            .prepare_cached("SELECT entity FROM mentions WHERE memory_id = ?1")
        else {
            return entities;
        };
        if let Ok(rows) = stmt.query_map(params![id.to_string()], |row| row.get::<_, String>(0)) {
            entities.extend(rows.flatten());
        }
        entities
    }
}

impl StorageBackend for GraphBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Graph
    }

    fn load_all(&self) -> Result<Vec<MemoryRecord>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT data FROM memories ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| row.get::<_, Vec<u8>>(0))?;

        let mut records = Vec::new();
        for row in rows {
            let data = row?;
            match serde_json::from_slice::<MemoryRecord>(&data) {
                Ok(record) => records.push(record),
                // One bad row loses one record, not the whole store.
                Err(e) => warn!(error = %e, "skipping undecodable memory row"),
            }
        }
        debug!(count = records.len(), "loaded memories from graph");
        Ok(records)
    }

    fn persist(&mut self, records: &[MemoryRecord]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM memories", [])?;
        tx.execute("DELETE FROM mentions", [])?;
        {
            let mut insert_memory = tx.prepare_cached(
                "INSERT INTO memories (id, kind, data, created_at) VALUES (?1, ?2, ?3, ?4)",
            )?;
            let mut insert_mention = tx.prepare_cached(
                "INSERT OR IGNORE INTO mentions (memory_id, entity) VALUES (?1, ?2)",
            )?;

            for record in records {
                let data = serde_json::to_vec(record)
                    .map_err(|e| EngramError::Serialization(e.to_string()))?;
                let id = record.id().to_string();
                insert_memory.execute(params![
                    id,
                    record.kind().as_str(),
                    data,
                    record.created_at().to_rfc3339(),
                ])?;
                for entity in extract_entities(record.content()) {
                    insert_mention.execute(params![id, entity.to_lowercase()])?;
                }
            }
        }
        tx.commit()?;
        debug!(count = records.len(), "persisted memories to graph");
        Ok(())
    }

    fn entity_links(&self, token: &str) -> Vec<MemoryId> {
        self.query_ids(
            "SELECT memory_id FROM mentions WHERE entity = ?1",
            &token.to_lowercase(),
        )
    }

    fn related_ids(&self, entity: &str, depth: u32) -> Vec<MemoryId> {
        let mut found: Vec<MemoryId> = Vec::new();
        let mut seen_ids: HashSet<MemoryId> = HashSet::new();
        let mut seen_entities: HashSet<String> = HashSet::new();
        let mut frontier: Vec<String> = vec![entity.to_lowercase()];
        seen_entities.extend(frontier.iter().cloned());

        for _ in 0..depth.max(1) {
            let mut hop_ids = Vec::new();
            for ent in frontier.drain(..) {
                for id in self.entity_links(&ent) {
                    if seen_ids.insert(id) {
                        found.push(id);
                        hop_ids.push(id);
                    }
                }
            }
            if hop_ids.is_empty() {
                break;
            }
            // Next frontier: entities co-mentioned by this hop's records.
            let mut next = BTreeSet::new();
            for id in hop_ids {
                for ent in self.entities_of(id) {
                    if !seen_entities.contains(&ent) {
                        next.insert(ent);
                    }
                }
            }
            seen_entities.extend(next.iter().cloned());
            frontier.extend(next);
        }
        found
    }

    fn entity_info(&self, entity: &str) -> EntityInfo {
        let name = entity.to_lowercase();
        let memory_ids = self.entity_links(&name);
        let mut related = BTreeSet::new();
        for &id in &memory_ids {
            for ent in self.entities_of(id) {
                if ent != name {
                    related.insert(ent);
                }
            }
        }
        EntityInfo {
            memory_ids,
            related_entities: related.into_iter().collect(),
        }
    }
}

/// Extract entity names from record content: quoted strings plus
/// capitalized words that are not common sentence starters. Deduplicated
/// case-insensitively, original casing preserved.
#[must_use]
pub fn extract_entities(content: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut entities = Vec::new();

    let mut push = |candidate: &str| {
        if seen.insert(candidate.to_lowercase()) {
            entities.push(candidate.to_string());
        }
    };

    // Quoted strings: every odd segment when splitting on '"'.
    for (i, segment) in content.split('"').enumerate() {
        if i % 2 == 1 && !segment.trim().is_empty() {
            push(segment.trim());
        }
    }

    // Capitalized words, likely proper nouns.
    for word in content.split_whitespace() {
        let clean = word.trim_matches(|c: char| c.is_ascii_punctuation());
        if clean.chars().count() > 1
            && clean.chars().next().is_some_and(char::is_uppercase)
            && !ENTITY_STOPLIST.contains(&clean.to_lowercase().as_str())
        {
            push(clean);
        }
    }

    entities
}
