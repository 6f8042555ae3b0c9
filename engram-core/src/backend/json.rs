//! Flat-file JSON backend.
//!
//! Stores the whole record set as one versioned document at
//! `<dir>/memories.json`:
//!
//! ```json
//! { "schema_version": "1.0", "memories": [ … ] }
//! ```
//!
//! Writes go through a temp file in the same directory followed by an
//! atomic rename, so a concurrent reader never observes a half-written
//! file and two writers resolve to last-writer-wins at whole-file
//! granularity. A document that fails to parse is quarantined (renamed
//! with a `.corrupt-<unix>` suffix), reported, and treated as an empty
//! store; the unreadable bytes are never overwritten in place.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::backend::{EntityInfo, StorageBackend};
use crate::error::{EngramError, Result};
use crate::memory::MemoryRecord;
use crate::types::{BackendKind, MemoryId};

/// Storage format version. Bump when the document envelope changes shape.
const SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Serialize, Deserialize)]
struct MemoryDocument {
    schema_version: String,
    memories: Vec<MemoryRecord>,
}

/// Flat-file storage backend.
#[derive(Debug)]
pub struct JsonBackend {
    path: PathBuf,
}

impl JsonBackend {
    /// Open (or initialize) the flat-file store under `dir`.
    ///
    /// # Errors
    /// Returns [`EngramError::Io`] if the directory cannot be created or
    /// the initial document cannot be written.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let backend = Self {
            path: dir.join("memories.json"),
        };
        if !backend.path.exists() {
            backend.write_document(&[])?;
            info!(path = %backend.path.display(), "initialized empty memory file");
        }
        Ok(backend)
    }

    /// Path of the backing JSON file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_document(&self, records: &[MemoryRecord]) -> Result<()> {
        let doc = MemoryDocument {
            schema_version: SCHEMA_VERSION.to_string(),
            memories: records.to_vec(),
        };
        let bytes = serde_json::to_vec_pretty(&doc)
            .map_err(|e| EngramError::Serialization(e.to_string()))?;

        // Temp file must live in the target directory for the rename to
        // stay on one filesystem (and therefore be atomic).
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| EngramError::Io(e.error))?;
        Ok(())
    }

    /// Move the unreadable file aside so the next persist cannot destroy
    /// whatever a human might still recover from it.
    fn quarantine(&self) {
        let quarantined = self
            .path
            .with_file_name(format!("memories.json.corrupt-{}", Utc::now().timestamp()));
        match std::fs::rename(&self.path, &quarantined) {
            Ok(()) => warn!(moved_to = %quarantined.display(), "quarantined corrupt memory file"),
            Err(e) => warn!(error = %e, "failed to quarantine corrupt memory file"),
        }
    }
}

impl StorageBackend for JsonBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Json
    }

    fn load_all(&self) -> Result<Vec<MemoryRecord>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<MemoryDocument>(&bytes) {
            Ok(doc) => {
                debug!(
                    version = %doc.schema_version,
                    count = doc.memories.len(),
                    "loaded memory file"
                );
                Ok(doc.memories)
            }
            // Legacy format: a bare record array. Accept it; the next
            // persist rewrites the versioned envelope.
            Err(_) => match serde_json::from_slice::<Vec<MemoryRecord>>(&bytes) {
                Ok(records) => {
                    info!(count = records.len(), "migrating legacy memory file format");
                    Ok(records)
                }
                Err(e) => {
                    let err = EngramError::CorruptStore {
                        path: self.path.clone(),
                        detail: e.to_string(),
                    };
                    warn!(%err, "unreadable memory file; continuing with an empty store");
                    self.quarantine();
                    Ok(Vec::new())
                }
            },
        }
    }

    fn persist(&mut self, records: &[MemoryRecord]) -> Result<()> {
        self.write_document(records)?;
        debug!(count = records.len(), path = %self.path.display(), "persisted memory file");
        Ok(())
    }

    // No entity graph on the flat file; callers degrade to substring search.
    fn entity_links(&self, _token: &str) -> Vec<MemoryId> {
        Vec::new()
    }

    fn related_ids(&self, _entity: &str, _depth: u32) -> Vec<MemoryId> {
        Vec::new()
    }

    fn entity_info(&self, _entity: &str) -> EntityInfo {
        EntityInfo::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{EpisodicMemory, SemanticMemory};
    use crate::types::Metadata;

    fn sample_records() -> Vec<MemoryRecord> {
        vec![
            MemoryRecord::Semantic(SemanticMemory::new("User prefers Python", Metadata::new())),
            MemoryRecord::Episodic(EpisodicMemory::new(
                "Helped debug authentication flow",
                None,
                Metadata::new(),
            )),
        ]
    }

    #[test]
    fn round_trip_persist_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut backend = JsonBackend::open(dir.path()).expect("open");
        let records = sample_records();

        backend.persist(&records).expect("persist");
        let loaded = backend.load_all().expect("load");
        assert_eq!(loaded, records);
    }

    #[test]
    fn open_initializes_versioned_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = JsonBackend::open(dir.path()).expect("open");

        let raw = std::fs::read_to_string(backend.path()).expect("read");
        let doc: serde_json::Value = serde_json::from_str(&raw).expect("parse");
        assert_eq!(doc["schema_version"], SCHEMA_VERSION);
        assert_eq!(doc["memories"], serde_json::json!([]));
    }

    #[test]
    fn legacy_bare_array_is_accepted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let records = sample_records();
        let legacy = serde_json::to_string(&records).expect("serialize");
        std::fs::write(dir.path().join("memories.json"), legacy).expect("write");

        let backend = JsonBackend::open(dir.path()).expect("open");
        let loaded = backend.load_all().expect("load");
        assert_eq!(loaded, records);
    }

    #[test]
    fn corrupt_file_quarantined_not_overwritten() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("memories.json");
        std::fs::write(&path, b"{ this is not json").expect("write");

        let backend = JsonBackend::open(dir.path()).expect("open");
        let loaded = backend.load_all().expect("load");
        assert!(loaded.is_empty());

        // The broken bytes moved aside under a .corrupt- name.
        let quarantined: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read_dir")
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name()
                    .to_string_lossy()
                    .starts_with("memories.json.corrupt-")
            })
            .collect();
        assert_eq!(quarantined.len(), 1);
    }

    #[test]
    fn persist_replaces_previous_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut backend = JsonBackend::open(dir.path()).expect("open");

        backend.persist(&sample_records()).expect("persist 1");
        let one =
            vec![MemoryRecord::Semantic(SemanticMemory::new("only one", Metadata::new()))];
        backend.persist(&one).expect("persist 2");

        let loaded = backend.load_all().expect("load");
        assert_eq!(loaded, one);
    }

    #[test]
    fn entity_methods_degrade_to_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = JsonBackend::open(dir.path()).expect("open");
        assert!(backend.entity_links("python").is_empty());
        assert!(backend.related_ids("python", 2).is_empty());
        assert!(backend.entity_info("python").memory_ids.is_empty());
    }
}
