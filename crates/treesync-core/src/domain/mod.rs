//! Domain types and pure logic
//!
//! This module contains the core domain types for treesync:
//! - Newtypes for validated storage paths and identifiers
//! - Listed directory trees
//! - Job settings and the cooperative enable switch
//! - Per-file outcome records
//! - Gitignore-style exclude rules
//! - Domain-specific error types

pub mod errors;
pub mod exclude;
pub mod file_tree;
pub mod job;
pub mod newtypes;
pub mod outcome;

// Re-export commonly used types
pub use errors::DomainError;
pub use exclude::ExcludeFilter;
pub use file_tree::{EntryKind, FileTree, Node};
pub use job::{Job, JobSwitch, ListSpeed, SyncMethod};
pub use newtypes::*;
pub use outcome::{CopyOutcome, DeleteOutcome, OutcomeStatus};
