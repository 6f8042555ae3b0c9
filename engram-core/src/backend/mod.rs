//! Storage backends — durable persistence behind the memory store.
//!
//! Two implementations share one capability contract:
//!
//! - [`GraphBackend`] (default): records plus entity-mention edges in a
//!   SQLite database, enabling relationship queries.
//! - [`JsonBackend`] (fallback): one human-readable JSON document, with
//!   atomic replace-on-write.
//!
//! Entity-aware methods have graceful degradation built into the contract:
//! the flat-file backend answers them with empty link sets and callers fall
//! back to substring search, so no operation ever fails with "unsupported".

pub mod graph;
pub mod json;

pub use graph::GraphBackend;
pub use json::JsonBackend;

use tracing::warn;

use crate::config::StorageConfig;
use crate::error::Result;
use crate::memory::MemoryRecord;
use crate::types::{BackendKind, MemoryId};

/// What a backend knows about one entity.
#[derive(Debug, Clone, Default)]
pub struct EntityInfo {
    /// IDs of records that mention the entity.
    pub memory_ids: Vec<MemoryId>,
    /// Other entities co-mentioned with it, lowercase.
    pub related_entities: Vec<String>,
}

/// Durable persistence for a [`MemoryRecord`] set.
///
/// `persist` writes the full record set atomically: a crash mid-write never
/// leaves a half-written store for the next `load_all` to observe.
pub trait StorageBackend {
    /// Which backend this is.
    fn kind(&self) -> BackendKind;

    /// Load every persisted record, in insertion order.
    ///
    /// # Errors
    /// Returns an error only for unrecoverable I/O or database failures;
    /// a corrupt flat file is quarantined and reported, not fatal.
    fn load_all(&self) -> Result<Vec<MemoryRecord>>;

    /// Persist the full record set, replacing previous contents.
    ///
    /// # Errors
    /// On failure the previously persisted state is left unchanged.
    fn persist(&mut self, records: &[MemoryRecord]) -> Result<()>;

    /// IDs of records directly linked to an entity node matching `token`
    /// (case-insensitive). Empty on the flat-file backend.
    fn entity_links(&self, token: &str) -> Vec<MemoryId>;

    /// IDs of records reachable from `entity` within `depth` relationship
    /// hops. Empty on the flat-file backend.
    fn related_ids(&self, entity: &str, depth: u32) -> Vec<MemoryId>;

    /// Everything the backend knows about `entity`. Empty on the flat-file
    /// backend.
    fn entity_info(&self, entity: &str) -> EntityInfo;
}

/// Open the backend named by `config`, falling back to the flat-file
/// backend when the graph backend cannot be constructed.
///
/// The fallback is an ordinary conditional: the caller observes which
/// backend is active through [`StorageBackend::kind`]; no data path is
/// silently lost.
///
/// # Errors
/// Returns an error only when the flat-file backend itself cannot be
/// opened (storage directory unusable).
pub fn open_backend(config: &StorageConfig) -> Result<Box<dyn StorageBackend>> {
    let dir = config.resolve_dir();
    match config.backend {
        BackendKind::Json => Ok(Box::new(JsonBackend::open(&dir)?)),
        BackendKind::Graph => match GraphBackend::open(&dir) {
            Ok(backend) => Ok(Box::new(backend)),
            Err(e) => {
                warn!(
                    error = %e,
                    dir = %dir.display(),
                    "graph backend unavailable; falling back to flat-file storage"
                );
                Ok(Box::new(JsonBackend::open(&dir)?))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BackendKind;

    #[test]
    fn preferred_json_backend_opens_directly() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = StorageConfig {
            backend: BackendKind::Json,
            dir: Some(dir.path().to_path_buf()),
        };
        let backend = open_backend(&config).expect("open");
        assert_eq!(backend.kind(), BackendKind::Json);
    }

    #[test]
    fn graph_failure_falls_back_to_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        // Occupy the graph subdirectory path with a plain file so the
        // graph backend cannot create its database there.
        std::fs::write(dir.path().join("graph"), b"not a directory").expect("write");

        let config = StorageConfig {
            backend: BackendKind::Graph,
            dir: Some(dir.path().to_path_buf()),
        };
        let backend = open_backend(&config).expect("open");
        assert_eq!(backend.kind(), BackendKind::Json);
    }
}
