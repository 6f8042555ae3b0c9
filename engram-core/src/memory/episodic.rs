//! Episodic memory — timestamped experiences.
//!
//! Every episode carries an explicit event timestamp; "recent" retrieval
//! orders by that timestamp, not by insertion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MemoryId, Metadata};

/// A recorded experience with a mandatory event timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodicMemory {
    /// Unique identifier.
    pub id: MemoryId,
    /// Natural language summary of what happened.
    pub content: String,
    /// When the event occurred. Defaults to the creation instant when the
    /// caller supplies none.
    pub occurred_at: DateTime<Utc>,
    /// Open metadata mapping (topic, emotion, …).
    #[serde(default)]
    pub metadata: Metadata,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last modified.
    pub updated_at: DateTime<Utc>,
}

impl EpisodicMemory {
    /// Create a new episodic memory.
    #[must_use]
    pub fn new(
        content: impl Into<String>,
        occurred_at: Option<DateTime<Utc>>,
        metadata: Metadata,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: MemoryId::new(),
            content: content.into(),
            occurred_at: occurred_at.unwrap_or(now),
            metadata,
            created_at: now,
            updated_at: now,
        }
    }
}
