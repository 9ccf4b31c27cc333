//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the traits the sync engine depends on; their implementations
//! live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IVaultStore`] - local vault enumeration, reads and writes
//! - [`IRemoteTransport`] - HTTP exchanges with the remote vault endpoint
//! - [`IStatusReporter`] - status text, notices and last-synced display

pub mod remote_transport;
pub mod status_reporter;
pub mod vault_store;

pub use remote_transport::{ChunkStream, IRemoteTransport, RemoteBody};
pub use status_reporter::{IStatusReporter, Notice, NoticeKind};
pub use vault_store::IVaultStore;
