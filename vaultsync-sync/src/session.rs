//! The vault surface used by the UI layer.
//!
//! A [`VaultSession`] owns one vault on one device: it unlocks it with a
//! [`SecretProvider`], serves reads and edits from the decrypted working
//! copy, and runs syncs through a [`SyncCoordinator`]. Every edit is sealed
//! and saved before it becomes visible. A sync changes local state only
//! after the coordinator reports a commit, and then replaces working copy
//! and base in a single snapshot write.

use crate::config::SyncConfig;
use crate::coordinator::{
    open_blob, seal_blob, BaseVault, SyncCoordinator, SyncInput, SyncKind, SyncOutcome,
};
use crate::error::{SyncError, SyncResult};
use crate::local::{LocalSnapshot, LocalStore};
use crate::locks::SyncLocks;
use crate::state::SyncState;
use crate::store::BlobStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use vaultsync_crypto::{KdfParams, Keychain, Salt, SecretProvider};
use vaultsync_types::{DeviceId, EntryId, VaultId};
use vaultsync_vault::{Entry, Vault};

/// State that exists only while the vault is unlocked.
struct Unlocked {
    keychain: Arc<Keychain>,
    salt: Salt,
    params: KdfParams,
    working: Vault,
    base: Option<BaseVault>,
}

/// One vault on one device.
pub struct VaultSession {
    vault_id: VaultId,
    device_id: DeviceId,
    local: Arc<dyn LocalStore>,
    coordinator: SyncCoordinator,
    locks: SyncLocks,
    unlocked: Option<Unlocked>,
}

impl VaultSession {
    pub fn new(
        vault_id: VaultId,
        device_id: DeviceId,
        remote: Arc<dyn BlobStore>,
        local: Arc<dyn LocalStore>,
        locks: SyncLocks,
        config: SyncConfig,
    ) -> Self {
        Self {
            vault_id,
            device_id,
            local,
            coordinator: SyncCoordinator::new(remote, config),
            locks,
            unlocked: None,
        }
    }

    pub fn vault_id(&self) -> VaultId {
        self.vault_id
    }

    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked.is_some()
    }

    /// Creates an empty vault on this device with a fresh salt. The remote
    /// copy is created by the first [`sync`](Self::sync).
    pub async fn create_vault(&mut self, provider: &dyn SecretProvider) -> SyncResult<()> {
        if self.local.load(&self.vault_id).await?.is_some() {
            return Err(SyncError::VaultExists);
        }

        let keychain = Arc::new(Keychain::from_provider(provider)?);
        let salt = Salt::random();
        let params = self.coordinator.config().kdf;
        let (working, blob) = seal_blob(&keychain, Vault::new(), salt, params).await?;

        self.local
            .save(&LocalSnapshot {
                vault_id: self.vault_id,
                device_id: self.device_id,
                working: blob,
                sync: None,
            })
            .await?;

        info!("Created vault {} on device {}", self.vault_id, self.device_id);
        self.unlocked = Some(Unlocked {
            keychain,
            salt,
            params,
            working,
            base: None,
        });
        Ok(())
    }

    /// Unlocks the vault.
    ///
    /// With local state, the working copy and base are decrypted; a wrong
    /// secret fails with [`SyncError::Authentication`] and nothing is
    /// written. Without local state, the remote copy is downloaded and
    /// adopted, which is how a new device joins a vault.
    pub async fn unlock(&mut self, provider: &dyn SecretProvider) -> SyncResult<()> {
        let keychain = Arc::new(Keychain::from_provider(provider)?);

        let unlocked = match self.local.load(&self.vault_id).await? {
            Some(snapshot) => {
                let salt = snapshot.working.salt;
                let params = snapshot.working.kdf_params;
                let working = open_blob(&keychain, snapshot.working).await?;
                let base = match snapshot.sync {
                    Some(state) => Some(BaseVault {
                        vault: open_blob(&keychain, state.base.clone()).await?,
                        state,
                    }),
                    None => None,
                };
                Unlocked {
                    keychain,
                    salt,
                    params,
                    working,
                    base,
                }
            }
            None => self.join(keychain).await?,
        };

        debug!(
            "Unlocked vault {} with {} entries",
            self.vault_id,
            unlocked.working.len()
        );
        self.unlocked = Some(unlocked);
        Ok(())
    }

    async fn join(&self, keychain: Arc<Keychain>) -> SyncResult<Unlocked> {
        let remote = self
            .coordinator
            .fetch(&keychain, self.vault_id)
            .await?
            .ok_or(SyncError::VaultNotFound)?;

        let state = SyncState::new(
            remote.blob.clone(),
            remote.vault.sync_version,
            remote.token,
        );
        self.local
            .save(&LocalSnapshot {
                vault_id: self.vault_id,
                device_id: self.device_id,
                working: remote.blob.clone(),
                sync: Some(state.clone()),
            })
            .await?;

        info!(
            "Device {} joined vault {} at version {}",
            self.device_id, self.vault_id, remote.vault.sync_version
        );
        Ok(Unlocked {
            keychain,
            salt: remote.blob.salt,
            params: remote.blob.kdf_params,
            working: remote.vault.clone(),
            base: Some(BaseVault {
                vault: remote.vault,
                state,
            }),
        })
    }

    /// Drops the decrypted vault and every derived key.
    pub fn lock(&mut self) {
        if self.unlocked.take().is_some() {
            debug!("Locked vault {}", self.vault_id);
        }
    }

    /// Synchronizes with the remote copy. Concurrent syncs of the same vault
    /// through a shared [`SyncLocks`] run one after the other.
    pub async fn sync(&mut self, cancel: &CancellationToken) -> SyncResult<SyncOutcome> {
        if self.locks.is_busy(&self.vault_id) {
            debug!("Sync of vault {} queued behind a running sync", self.vault_id);
        }
        let _guard = self.locks.acquire(self.vault_id).await;
        let unlocked = self.unlocked.as_ref().ok_or(SyncError::Locked)?;

        let input = SyncInput {
            vault_id: self.vault_id,
            local: &unlocked.working,
            base: unlocked.base.as_ref(),
            salt: unlocked.salt,
            params: unlocked.params,
        };
        let outcome = self
            .coordinator
            .sync(&unlocked.keychain, input, cancel)
            .await?;

        if outcome.kind != SyncKind::NoOp {
            self.local
                .save(&LocalSnapshot {
                    vault_id: self.vault_id,
                    device_id: self.device_id,
                    working: outcome.state.base.clone(),
                    sync: Some(outcome.state.clone()),
                })
                .await?;

            if let Some(unlocked) = self.unlocked.as_mut() {
                unlocked.salt = outcome.state.base.salt;
                unlocked.params = outcome.state.base.kdf_params;
                unlocked.working = outcome.vault.clone();
                unlocked.base = Some(BaseVault {
                    vault: outcome.vault.clone(),
                    state: outcome.state.clone(),
                });
            }
        }
        Ok(outcome)
    }

    /// A live entry by id.
    pub fn get_entry(&self, id: &EntryId) -> SyncResult<&Entry> {
        self.working()?
            .get(id)
            .filter(|e| !e.is_deleted())
            .ok_or(SyncError::EntryNotFound(*id))
    }

    /// Live entries whose name, username, URLs or note contain `query`,
    /// ignoring case.
    pub fn search_entries(&self, query: &str) -> SyncResult<Vec<&Entry>> {
        Ok(self.working()?.search(query))
    }

    /// All live entries in id order.
    pub fn entries(&self) -> SyncResult<Vec<&Entry>> {
        Ok(self.working()?.live_entries().collect())
    }

    /// Adds a new entry, stamped as written now by this device. Ids are
    /// never reused: an id already in the vault, even as a tombstone, is
    /// refused with [`SyncError::EntryExists`].
    pub async fn add_entry(&mut self, mut entry: Entry) -> SyncResult<EntryId> {
        let mut working = self.working()?.clone();
        let id = entry.id;
        if working.get(&id).is_some() {
            return Err(SyncError::EntryExists(id));
        }
        entry.deleted_at = None;
        entry.touch(self.device_id);
        working.upsert(entry);
        self.persist(working).await?;
        debug!("Added entry {} to vault {}", id, self.vault_id);
        Ok(id)
    }

    /// Applies `edit` to a live entry and bumps its modification time.
    pub async fn update_entry(
        &mut self,
        id: &EntryId,
        edit: impl FnOnce(&mut Entry),
    ) -> SyncResult<()> {
        let mut entry = self.get_entry(id)?.clone();
        edit(&mut entry);
        entry.id = *id;
        entry.deleted_at = None;
        entry.touch(self.device_id);

        let mut working = self.working()?.clone();
        working.upsert(entry);
        self.persist(working).await?;
        debug!("Updated entry {} in vault {}", id, self.vault_id);
        Ok(())
    }

    /// Replaces a live entry with a tombstone so the deletion syncs.
    pub async fn delete_entry(&mut self, id: &EntryId) -> SyncResult<()> {
        let mut entry = self.get_entry(id)?.clone();
        entry.mark_deleted(self.device_id);

        let mut working = self.working()?.clone();
        working.upsert(entry);
        self.persist(working).await?;
        debug!("Deleted entry {} from vault {}", id, self.vault_id);
        Ok(())
    }

    fn working(&self) -> SyncResult<&Vault> {
        self.unlocked
            .as_ref()
            .map(|u| &u.working)
            .ok_or(SyncError::Locked)
    }

    /// Seals and saves `working`, then makes it the in-memory working copy.
    async fn persist(&mut self, working: Vault) -> SyncResult<()> {
        let unlocked = self.unlocked.as_ref().ok_or(SyncError::Locked)?;
        let (working, blob) =
            seal_blob(&unlocked.keychain, working, unlocked.salt, unlocked.params).await?;

        self.local
            .save(&LocalSnapshot {
                vault_id: self.vault_id,
                device_id: self.device_id,
                working: blob,
                sync: unlocked.base.as_ref().map(|b| b.state.clone()),
            })
            .await?;

        if let Some(unlocked) = self.unlocked.as_mut() {
            unlocked.working = working;
        }
        Ok(())
    }
}

impl std::fmt::Debug for VaultSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSession")
            .field("vault_id", &self.vault_id)
            .field("device_id", &self.device_id)
            .field("unlocked", &self.is_unlocked())
            .finish_non_exhaustive()
    }
}
