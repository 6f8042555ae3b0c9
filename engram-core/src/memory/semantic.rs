//! Semantic memory — timeless facts and preferences.
//!
//! The central correctness requirement lives here: when a fact changes
//! ("brother changed jobs"), the existing record is rewritten in place
//! rather than a contradicting fact being appended. The store performs the
//! matching; [`SemanticMemory::rewrite`] performs the replacement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MemoryId, Metadata};

/// A single fact or preference held about the user or project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticMemory {
    /// Unique identifier.
    pub id: MemoryId,
    /// The fact in natural language.
    pub content: String,
    /// Open metadata mapping (project, topic, tags, …).
    #[serde(default)]
    pub metadata: Metadata,
    /// When this fact was first recorded.
    pub created_at: DateTime<Utc>,
    /// When this fact was last rewritten.
    pub updated_at: DateTime<Utc>,
}

impl SemanticMemory {
    /// Create a new semantic memory.
    #[must_use]
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        let now = Utc::now();
        Self {
            id: MemoryId::new(),
            content: content.into(),
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the fact's content and bump the update timestamp.
    /// The record keeps its identity.
    pub fn rewrite(&mut self, new_content: impl Into<String>) {
        self.content = new_content.into();
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrite_keeps_identity_and_bumps_timestamp() {
        let mut fact = SemanticMemory::new("User likes TypeScript", Metadata::new());
        let id = fact.id;
        let created = fact.created_at;

        fact.rewrite("User loves TypeScript");

        assert_eq!(fact.id, id);
        assert_eq!(fact.created_at, created);
        assert_eq!(fact.content, "User loves TypeScript");
        assert!(fact.updated_at >= created);
    }
}
