//! Vault sync for a multi-device password manager.
//!
//! Each vault exists once remotely, as a single encrypted blob in a store
//! that supports conditional writes. Devices keep a working copy plus the
//! last vault they agreed on with the remote (the base) and reconcile by
//! three-way merge.
//!
//! ## Components
//!
//! - **Store**: the [`BlobStore`] capability and its memory and directory
//!   implementations
//! - **Local**: per-device persistence of working copy and [`SyncState`]
//! - **Coordinator**: the fetch / decide / merge / write state machine
//! - **Session**: [`VaultSession`], the surface the UI layer talks to
//!
//! ## Sync process
//!
//! 1. **Fetch**: compare the remote token with the one recorded at the last
//!    commit; download and decrypt only if it moved
//! 2. **Decide**: no-op, push, fast-forward or merge, depending on which
//!    sides changed
//! 3. **Merge**: three-way merge against the base
//! 4. **Write**: conditional put on the observed token; on a lost race,
//!    start over from Fetch
//! 5. **Commit**: swap working copy and base in one local write
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use vaultsync_sync::{MemoryBlobStore, MemoryLocalStore, SyncConfig, SyncLocks, VaultSession};
//! use vaultsync_types::{DeviceId, VaultId};
//!
//! let session = VaultSession::new(
//!     VaultId::new(),
//!     DeviceId::new(),
//!     Arc::new(MemoryBlobStore::new()),
//!     Arc::new(MemoryLocalStore::new()),
//!     SyncLocks::new(),
//!     SyncConfig {
//!         device_name: "My Laptop".to_string(),
//!         ..Default::default()
//!     },
//! );
//! assert!(!session.is_unlocked());
//! ```

mod config;
mod coordinator;
mod error;
pub mod local;
mod locks;
mod retry;
mod session;
pub mod state;
pub mod store;

pub use config::{RetryConfig, SyncConfig};
pub use coordinator::{BaseVault, RemoteVault, SyncCoordinator, SyncInput, SyncKind, SyncOutcome};
pub use error::{SyncError, SyncResult};
pub use local::{FsLocalStore, LocalSnapshot, LocalStore, MemoryLocalStore};
pub use locks::SyncLocks;
pub use session::VaultSession;
pub use state::SyncState;
pub use store::{
    BlobStore, FsBlobStore, FsBlobStoreConfig, MemoryBlobStore, StoreError, StoreResult,
    VersionToken,
};
