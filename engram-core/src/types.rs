//! Core type definitions for the engram memory system.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Unique identifier for a memory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemoryId(pub Uuid);

impl MemoryId {
    /// Create a new random memory ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an ID from its canonical string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for MemoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Record kinds
// ---------------------------------------------------------------------------

/// The three memory kinds in the engram taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    /// A timeless fact or preference.
    Semantic,
    /// A timestamped experience.
    Episodic,
    /// A named, ordered list of workflow steps.
    Procedural,
}

impl MemoryKind {
    /// Stable lowercase name, matching the persisted `kind` tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Semantic => "semantic",
            Self::Episodic => "episodic",
            Self::Procedural => "procedural",
        }
    }

    /// Parse a kind from its lowercase name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "semantic" => Some(Self::Semantic),
            "episodic" => Some(Self::Episodic),
            "procedural" => Some(Self::Procedural),
            _ => None,
        }
    }
}

impl fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Open string-to-string mapping attached to every record (project, topic,
/// trigger, tags, …). `BTreeMap` keeps serialization deterministic.
pub type Metadata = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

/// Which storage backend a store is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Flat-file JSON document.
    Json,
    /// Relationship graph over SQLite.
    Graph,
}

impl BackendKind {
    /// Stable lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Graph => "graph",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Snapshot of store contents, per kind, plus the active backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Total number of records.
    pub total: usize,
    /// Number of semantic records.
    pub semantic: usize,
    /// Number of episodic records.
    pub episodic: usize,
    /// Number of procedural records.
    pub procedural: usize,
    /// The backend actually in use (fallback is observable here).
    pub backend: BackendKind,
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {} | Semantic: {} | Episodic: {} | Procedural: {} | Backend: {}",
            self.total, self.semantic, self.episodic, self.procedural, self.backend
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_name() {
        for kind in [MemoryKind::Semantic, MemoryKind::Episodic, MemoryKind::Procedural] {
            assert_eq!(MemoryKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MemoryKind::parse("emotional"), None);
    }

    #[test]
    fn memory_id_parse_rejects_garbage() {
        let id = MemoryId::new();
        assert_eq!(MemoryId::parse(&id.to_string()), Some(id));
        assert_eq!(MemoryId::parse("not-a-uuid"), None);
    }

    #[test]
    fn stats_line_names_backend() {
        let stats = StoreStats {
            total: 3,
            semantic: 1,
            episodic: 1,
            procedural: 1,
            backend: BackendKind::Json,
        };
        assert_eq!(
            stats.to_string(),
            "Total: 3 | Semantic: 1 | Episodic: 1 | Procedural: 1 | Backend: json"
        );
    }
}
