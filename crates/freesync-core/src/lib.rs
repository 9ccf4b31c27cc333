//! FreeSync Core - Domain logic and wire format
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `VaultPath`, `TransferSet`, `SyncState`, `SyncError`
//! - **Multipart codec** - `multipart/form-data` encoding and streaming decoding
//! - **Port definitions** - Traits for adapters: `IVaultStore`, `IRemoteTransport`, `IStatusReporter`
//! - **Configuration** - the YAML config file and its validation
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure logic with no I/O. Ports define trait
//! interfaces that adapter crates implement.

pub mod config;
pub mod domain;
pub mod multipart;
pub mod ports;

pub use domain::SyncError;
