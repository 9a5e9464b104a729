//! Sync bookkeeping.
//!
//! A device remembers the last vault it agreed on with the remote (the
//! base), the remote version it saw at that point, and the token the store
//! handed out for it. The base is what makes three-way merge possible; the
//! token is what the next conditional write is made against.

use crate::store::VersionToken;
use serde::{Deserialize, Serialize};
use vaultsync_vault::EncryptedBlob;

/// Persisted sync state of one vault on one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// The last committed vault, still encrypted.
    pub base: EncryptedBlob,
    /// `sync_version` of the base.
    pub base_sync_version: u64,
    /// Remote token at the time the base was committed.
    pub remote_token: VersionToken,
}

impl SyncState {
    pub fn new(base: EncryptedBlob, base_sync_version: u64, remote_token: VersionToken) -> Self {
        Self {
            base,
            base_sync_version,
            remote_token,
        }
    }
}
