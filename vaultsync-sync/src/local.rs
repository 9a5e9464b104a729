//! Device-local persistence.
//!
//! A device keeps two things per vault: the working copy it edits and the
//! [`SyncState`] of the last commit. Both live in one [`LocalSnapshot`] and
//! are saved together, so a crash can never leave a working copy paired
//! with the wrong base.

use crate::error::SyncResult;
use crate::state::SyncState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::fs;
use tracing::debug;
use vaultsync_types::{DeviceId, VaultId};
use vaultsync_vault::EncryptedBlob;

/// Everything a device persists for one vault. Secrets and plaintext are
/// never part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSnapshot {
    pub vault_id: VaultId,
    pub device_id: DeviceId,
    /// The working copy, including edits not yet synced.
    pub working: EncryptedBlob,
    /// `None` until the first successful sync.
    pub sync: Option<SyncState>,
}

/// Storage for [`LocalSnapshot`]s. `save` must be atomic: a reader sees
/// either the old snapshot or the new one.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn load(&self, vault: &VaultId) -> SyncResult<Option<LocalSnapshot>>;

    async fn save(&self, snapshot: &LocalSnapshot) -> SyncResult<()>;
}

/// Snapshots as JSON files in a directory.
#[derive(Debug, Clone)]
pub struct FsLocalStore {
    root: PathBuf,
}

impl FsLocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the snapshot file for `vault`.
    pub fn path_for(&self, vault: &VaultId) -> PathBuf {
        self.root.join(format!("{vault}.local.json"))
    }
}

#[async_trait]
impl LocalStore for FsLocalStore {
    async fn load(&self, vault: &VaultId) -> SyncResult<Option<LocalSnapshot>> {
        match fs::read(self.path_for(vault)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, snapshot: &LocalSnapshot) -> SyncResult<()> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let path = self.path_for(&snapshot.vault_id);
        let tmp = path.with_extension("json.tmp");

        fs::create_dir_all(&self.root).await?;
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, &path).await?;
        debug!("Saved local snapshot for vault {}", snapshot.vault_id);
        Ok(())
    }
}

/// Snapshots kept in memory.
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    snapshots: Mutex<HashMap<VaultId, LocalSnapshot>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalStore for MemoryLocalStore {
    async fn load(&self, vault: &VaultId) -> SyncResult<Option<LocalSnapshot>> {
        let snapshots = self.snapshots.lock().unwrap_or_else(|p| p.into_inner());
        Ok(snapshots.get(vault).cloned())
    }

    async fn save(&self, snapshot: &LocalSnapshot) -> SyncResult<()> {
        let mut snapshots = self.snapshots.lock().unwrap_or_else(|p| p.into_inner());
        snapshots.insert(snapshot.vault_id, snapshot.clone());
        Ok(())
    }
}
