//! Configuration for the engram memory system, loadable from TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::BackendKind;

/// Top-level engram configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngramConfig {
    /// Storage backend selection and location.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Keyword search settings.
    #[serde(default)]
    pub search: SearchConfig,
    /// Context assembly settings.
    #[serde(default)]
    pub context: ContextConfig,
}

impl EngramConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `EngramError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::EngramError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

/// Storage backend selection and location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Preferred backend. When the graph backend cannot be opened the store
    /// falls back to the flat-file backend (observable via `stats()`).
    #[serde(default = "default_backend")]
    pub backend: BackendKind,
    /// Storage directory. Defaults to `~/.engram` when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl StorageConfig {
    /// The directory records live under: the configured `dir`, or the
    /// user-scoped default.
    #[must_use]
    pub fn resolve_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".engram")
        })
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            dir: None,
        }
    }
}

/// Keyword search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Result cap when the caller does not supply one.
    #[serde(default = "default_5")]
    pub default_limit: usize,
    /// Relationship hops for `find_related` on the graph backend.
    #[serde(default = "default_2")]
    pub related_depth: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            related_depth: 2,
        }
    }
}

/// Context assembly settings, used when callers take the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Maximum semantic records per context block.
    #[serde(default = "default_10")]
    pub max_facts: usize,
    /// Maximum episodic records per context block.
    #[serde(default = "default_5")]
    pub max_episodes: usize,
    /// Whether procedures are included by default.
    #[serde(default = "default_true")]
    pub include_procedures: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_facts: 10,
            max_episodes: 5,
            include_procedures: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_backend() -> BackendKind {
    BackendKind::Graph
}
fn default_true() -> bool {
    true
}
fn default_2() -> u32 {
    2
}
fn default_5() -> usize {
    5
}
fn default_10() -> usize {
    10
}
