//! treesync Core - Domain types, ports and configuration
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `FileTree`, `Job`, `JobSwitch`, outcome records, `ExcludeFilter`
//! - **Port definitions** - Traits for adapters: `IStorageClient`, `IOutcomeSink`
//! - **Configuration** - YAML-backed [`config::Config`] with validation
//!
//! # Architecture
//!
//! The domain module holds plain data and pure logic. Ports define the trait
//! interfaces the sync engine drives; their implementations live in adapter
//! crates (or in tests as in-memory fakes).

pub mod config;
pub mod domain;
pub mod ports;
