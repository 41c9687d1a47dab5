//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the sync engine depends on; their
//! implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IStorageClient`] - Listing, mkdir, copy and delete on a storage backend
//! - [`IOutcomeSink`] - Receives per-file copy/delete outcomes as they happen

pub mod outcome_sink;
pub mod storage_client;

pub use outcome_sink::IOutcomeSink;
pub use storage_client::IStorageClient;
