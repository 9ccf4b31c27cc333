//! FreeSync Sync - Whole-vault synchronization
//!
//! Provides:
//! - Full-vault upload and download passes with a single-in-flight guard
//! - A tokio::fs adapter for the local vault
//! - Interval, manual and shutdown scheduling
//!
//! ## Modules
//!
//! - [`engine`] - Sync engine orchestrating upload/download passes
//! - [`filesystem`] - Local vault adapter (recursive walk, atomic writes)
//! - [`scheduler`] - Timer and trigger loop driving the engine
//! - [`reporter`] - Status reporter that writes to `tracing`

pub mod engine;
pub mod filesystem;
pub mod reporter;
pub mod scheduler;

#[cfg(test)]
mod testing;

pub use engine::SyncEngine;
pub use filesystem::LocalVaultAdapter;
pub use reporter::TracingStatusReporter;
pub use scheduler::{ManualTrigger, SchedulerConfig, SyncScheduler};
