//! Procedural memory — named workflows with ordered steps.
//!
//! Procedures are additionally keyed by name: adding a procedure whose name
//! already exists replaces that procedure's steps instead of inserting a
//! duplicate. The record keeps a rendered text block alongside the typed
//! steps so that keyword search and context assembly see the same text the
//! prompt will.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MemoryId, Metadata};

/// A named workflow with ordered steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProceduralMemory {
    /// Unique identifier.
    pub id: MemoryId,
    /// Workflow name, unique within the procedural subset.
    pub name: String,
    /// Ordered step descriptions.
    pub steps: Vec<String>,
    /// Rendered text block, regenerated whenever steps change.
    pub content: String,
    /// Open metadata mapping (trigger, project, …).
    #[serde(default)]
    pub metadata: Metadata,
    /// When this procedure was first recorded.
    pub created_at: DateTime<Utc>,
    /// When the steps were last replaced.
    pub updated_at: DateTime<Utc>,
}

impl ProceduralMemory {
    /// Create a new procedural memory.
    #[must_use]
    pub fn new(name: impl Into<String>, steps: Vec<String>, metadata: Metadata) -> Self {
        let name = name.into();
        let content = render(&name, &steps);
        let now = Utc::now();
        Self {
            id: MemoryId::new(),
            name,
            steps,
            content,
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the steps, re-render the text block, and bump the update
    /// timestamp. Identity and creation time are kept.
    pub fn replace_steps(&mut self, steps: Vec<String>) {
        self.steps = steps;
        self.content = render(&self.name, &self.steps);
        self.updated_at = Utc::now();
    }
}

/// Render the prompt-facing text block for a procedure.
fn render(name: &str, steps: &[String]) -> String {
    let mut out = format!("Procedure: {name}\nSteps:");
    for (i, step) in steps.iter().enumerate() {
        out.push_str(&format!("\n{}. {step}", i + 1));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_block_numbers_steps() {
        let proc = ProceduralMemory::new(
            "deploy",
            vec!["Test".into(), "Build".into(), "Push".into()],
            Metadata::new(),
        );
        assert_eq!(proc.content, "Procedure: deploy\nSteps:\n1. Test\n2. Build\n3. Push");
    }

    #[test]
    fn replace_steps_rerenders() {
        let mut proc =
            ProceduralMemory::new("deploy", vec!["Test".into(), "Build".into()], Metadata::new());
        let id = proc.id;

        proc.replace_steps(vec!["Test".into(), "Build".into(), "Deploy".into()]);

        assert_eq!(proc.id, id);
        assert_eq!(proc.steps.len(), 3);
        assert!(proc.content.ends_with("3. Deploy"));
    }
}
