//! Memory record definitions — the three kinds and the unified record enum.

pub mod episodic;
pub mod procedural;
pub mod semantic;

pub use episodic::EpisodicMemory;
pub use procedural::ProceduralMemory;
pub use semantic::SemanticMemory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MemoryId, MemoryKind, Metadata};

/// A unified memory record of any kind.
///
/// Serializes as a single object with a `kind` tag alongside the fields of
/// the inner struct, so the flat-file backend persists one flat object per
/// record:
///
/// ```json
/// { "kind": "semantic", "id": "…", "content": "…", "metadata": {}, … }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MemoryRecord {
    /// A timeless fact or preference.
    Semantic(SemanticMemory),
    /// A timestamped experience.
    Episodic(EpisodicMemory),
    /// A named workflow with ordered steps.
    Procedural(ProceduralMemory),
}

impl MemoryRecord {
    /// The record's unique identifier.
    #[must_use]
    pub fn id(&self) -> MemoryId {
        match self {
            Self::Semantic(m) => m.id,
            Self::Episodic(m) => m.id,
            Self::Procedural(m) => m.id,
        }
    }

    /// The record's kind.
    #[must_use]
    pub fn kind(&self) -> MemoryKind {
        match self {
            Self::Semantic(_) => MemoryKind::Semantic,
            Self::Episodic(_) => MemoryKind::Episodic,
            Self::Procedural(_) => MemoryKind::Procedural,
        }
    }

    /// The prompt-facing text of the record. For procedures this is the
    /// rendered name-plus-steps block.
    #[must_use]
    pub fn content(&self) -> &str {
        match self {
            Self::Semantic(m) => &m.content,
            Self::Episodic(m) => &m.content,
            Self::Procedural(m) => &m.content,
        }
    }

    /// The record's metadata mapping.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        match self {
            Self::Semantic(m) => &m.metadata,
            Self::Episodic(m) => &m.metadata,
            Self::Procedural(m) => &m.metadata,
        }
    }

    /// When the record was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Semantic(m) => m.created_at,
            Self::Episodic(m) => m.created_at,
            Self::Procedural(m) => m.created_at,
        }
    }

    /// When the record was last modified.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        match self {
            Self::Semantic(m) => m.updated_at,
            Self::Episodic(m) => m.updated_at,
            Self::Procedural(m) => m.updated_at,
        }
    }

    /// Event timestamp, for episodic records only.
    #[must_use]
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Episodic(m) => Some(m.occurred_at),
            _ => None,
        }
    }

    /// Procedure name, for procedural records only.
    #[must_use]
    pub fn procedure_name(&self) -> Option<&str> {
        match self {
            Self::Procedural(m) => Some(&m.name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_with_flat_kind_tag() {
        let record = MemoryRecord::Semantic(SemanticMemory::new("User prefers Python", {
            let mut m = Metadata::new();
            m.insert("topic".into(), "languages".into());
            m
        }));

        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["kind"], "semantic");
        assert_eq!(json["content"], "User prefers Python");
        assert_eq!(json["metadata"]["topic"], "languages");

        let back: MemoryRecord = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, record);
    }

    #[test]
    fn procedural_record_round_trips_steps() {
        let record = MemoryRecord::Procedural(ProceduralMemory::new(
            "review",
            vec!["Check types".into(), "Verify tests".into()],
            Metadata::new(),
        ));

        let json = serde_json::to_string(&record).expect("serialize");
        let back: MemoryRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, record);
        assert_eq!(back.procedure_name(), Some("review"));
    }

    #[test]
    fn kind_accessor_matches_variant() {
        let fact = MemoryRecord::Semantic(SemanticMemory::new("a", Metadata::new()));
        let episode = MemoryRecord::Episodic(EpisodicMemory::new("b", None, Metadata::new()));
        assert_eq!(fact.kind(), MemoryKind::Semantic);
        assert_eq!(episode.kind(), MemoryKind::Episodic);
        assert!(episode.occurred_at().is_some());
        assert!(fact.occurred_at().is_none());
    }
}
