//! # Engram Core Library
//!
//! Persistent memory layer for LLM agents. A single [`MemoryStore`] holds
//! three kinds of records:
//!
//! - **Semantic** — timeless facts and preferences ("User prefers dark mode")
//! - **Episodic** — timestamped experiences ("Helped debug the auth flow")
//! - **Procedural** — named, ordered workflow steps ("deploy": test, build, push)
//!
//! Durability is delegated to a pluggable [`backend::StorageBackend`]:
//! a relationship-graph backend over SQLite (default, entity-aware) or a
//! flat-file JSON backend (zero-surprise fallback). The [`SearchEngine`]
//! ranks records by keyword overlap and the [`ContextAssembler`] turns the
//! top hits into a prompt-ready text block.
//!
//! The store is an explicitly constructed, explicitly owned value — open a
//! backend, pass the store where it is needed, drop it to close. There is
//! no global singleton.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod memory;
pub mod search;
pub mod store;
pub mod types;

pub use config::EngramConfig;
pub use context::ContextAssembler;
pub use error::EngramError;
pub use memory::MemoryRecord;
pub use search::SearchEngine;
pub use store::MemoryStore;
pub use types::*;
