//! Domain entities and value objects
//!
//! - [`newtypes::VaultPath`] - validated relative path, the file identity key
//! - [`transfer`] - `VaultFile` and `TransferSet`
//! - [`sync_state`] - `SyncState`, pass reports and the status line text
//! - [`vault_id`] - remote resource key derivation
//! - [`errors::SyncError`] - the error taxonomy shared by every crate

pub mod errors;
pub mod newtypes;
pub mod sync_state;
pub mod transfer;
pub mod vault_id;

pub use errors::SyncError;
pub use newtypes::VaultPath;
pub use sync_state::{
    describe_last_synced, SyncDirection, SyncOutcome, SyncReport, SyncState, SyncStatus,
};
pub use transfer::{TransferSet, VaultFile};
pub use vault_id::vault_id;
