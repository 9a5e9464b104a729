//! The sync state machine.
//!
//! One call to [`SyncCoordinator::sync`] runs
//! `Fetching → Deciding → Merging → Writing → Committed`, going back to
//! Fetching whenever the conditional write loses a race. The coordinator
//! never touches local persistence. It returns the vault and [`SyncState`]
//! to commit and leaves the swap to the caller, so every failure leaves the
//! device exactly as it was before the call.
//!
//! Cancellation is honored until the write is issued. From then on the
//! write is awaited and its outcome reported, since abandoning it would
//! leave the device unsure whether the remote holds its changes.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::retry::with_backoff;
use crate::state::SyncState;
use crate::store::{BlobStore, StoreError, VersionToken};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vaultsync_crypto::{KdfParams, Keychain, Salt};
use vaultsync_merge::{merge, ConflictRecord};
use vaultsync_types::VaultId;
use vaultsync_vault::{EncryptedBlob, Vault, SCHEMA_VERSION};

/// How a sync ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    /// Nothing changed on either side.
    NoOp,
    /// Local edits written over an unchanged remote.
    Pushed,
    /// Remote changes adopted; nothing written.
    FastForward,
    /// Both sides changed; the merge was written.
    Merged,
}

/// Result of a successful sync.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub kind: SyncKind,
    /// Fetch/write rounds used. Greater than 1 only if a write lost a race.
    pub attempts: u32,
    /// `sync_version` of the committed vault.
    pub sync_version: u64,
    /// Conflicts resolved by the merge, for later review.
    pub conflicts: Vec<ConflictRecord>,
    /// The vault to install as both working copy and base.
    pub vault: Vault,
    /// Bookkeeping to persist with it.
    pub state: SyncState,
}

/// A decrypted base vault with its bookkeeping.
#[derive(Debug, Clone)]
pub struct BaseVault {
    pub vault: Vault,
    pub state: SyncState,
}

/// What a device brings to a sync.
#[derive(Debug, Clone, Copy)]
pub struct SyncInput<'a> {
    pub vault_id: VaultId,
    /// The working copy.
    pub local: &'a Vault,
    /// `None` before the first successful sync.
    pub base: Option<&'a BaseVault>,
    /// Key settings for writes when no remote blob dictates them.
    pub salt: Salt,
    pub params: KdfParams,
}

/// A remote vault after download and decryption.
#[derive(Debug, Clone)]
pub struct RemoteVault {
    pub token: VersionToken,
    pub blob: EncryptedBlob,
    pub vault: Vault,
}

/// What Fetching observed.
enum Remote {
    Absent,
    Unchanged(VersionToken),
    Changed(RemoteVault),
}

/// What Deciding chose to write.
struct Candidate {
    vault: Vault,
    expected: Option<VersionToken>,
    remote_version: u64,
    kind: SyncKind,
    conflicts: Vec<ConflictRecord>,
    salt: Salt,
    params: KdfParams,
}

/// Drives a vault to agreement with its remote copy.
pub struct SyncCoordinator {
    store: Arc<dyn BlobStore>,
    config: SyncConfig,
}

impl SyncCoordinator {
    pub fn new(store: Arc<dyn BlobStore>, config: SyncConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Downloads and decrypts the remote vault, if there is one.
    ///
    /// Version checks on the blob header run before any key derivation, so
    /// a vault from a newer build is refused without paying for Argon2.
    pub async fn fetch(
        &self,
        keychain: &Arc<Keychain>,
        vault_id: VaultId,
    ) -> SyncResult<Option<RemoteVault>> {
        let fetched = with_backoff(&self.config.retry, "fetch", || async move {
            self.store.get(&vault_id).await.map_err(SyncError::from)
        })
        .await?;
        let Some((token, bytes)) = fetched else {
            return Ok(None);
        };

        let blob = EncryptedBlob::from_bytes(&bytes)?;
        blob.check_supported()?;
        let vault = open_blob(keychain, blob.clone()).await?;
        debug!(
            "Fetched vault {} at sync version {} (token {})",
            vault_id, vault.sync_version, token
        );
        Ok(Some(RemoteVault { token, blob, vault }))
    }

    /// Runs one sync session.
    pub async fn sync(
        &self,
        keychain: &Arc<Keychain>,
        input: SyncInput<'_>,
        cancel: &CancellationToken,
    ) -> SyncResult<SyncOutcome> {
        let empty = Vault::new();
        let (base_vault, known_token, base_version) = match input.base {
            Some(base) => (
                &base.vault,
                Some(&base.state.remote_token),
                base.state.base_sync_version,
            ),
            None => (&empty, None, 0),
        };
        let pending = match input.base {
            Some(base) => !input.local.same_entries(&base.vault),
            None => !input.local.is_empty(),
        };
        let max_attempts = self.config.max_conflict_retries.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!("Sync {} attempt {}: fetching", input.vault_id, attempts);
            let observed = self.observe(keychain, input.vault_id, known_token);
            let remote = or_cancel(cancel, observed).await?;

            debug!("Sync {} attempt {}: deciding", input.vault_id, attempts);
            let candidate = match (remote, input.base) {
                (Remote::Unchanged(_), Some(base)) if !pending => {
                    info!(
                        "[{}] Vault {} already in sync at version {}",
                        self.config.device_name, input.vault_id, base_version
                    );
                    return Ok(SyncOutcome {
                        kind: SyncKind::NoOp,
                        attempts,
                        sync_version: base_version,
                        conflicts: Vec::new(),
                        vault: input.local.clone(),
                        state: base.state.clone(),
                    });
                }
                (Remote::Unchanged(token), _) => Candidate {
                    vault: input.local.clone(),
                    expected: Some(token),
                    remote_version: base_version,
                    kind: SyncKind::Pushed,
                    conflicts: Vec::new(),
                    salt: input.salt,
                    params: input.params,
                },
                (Remote::Absent, _) => Candidate {
                    vault: input.local.clone(),
                    expected: None,
                    remote_version: 0,
                    kind: SyncKind::Pushed,
                    conflicts: Vec::new(),
                    salt: input.salt,
                    params: input.params,
                },
                (Remote::Changed(remote), _) => {
                    if remote.vault.schema_version != input.local.schema_version {
                        warn!(
                            "Refusing to sync vault {}: remote schema {} differs from local {}",
                            input.vault_id, remote.vault.schema_version, input.local.schema_version
                        );
                        return Err(SyncError::SchemaVersion {
                            found: remote.vault.schema_version,
                            supported: SCHEMA_VERSION,
                        });
                    }
                    if !pending {
                        return Ok(self.fast_forward(input.vault_id, remote, attempts, Vec::new()));
                    }

                    debug!("Sync {} attempt {}: merging", input.vault_id, attempts);
                    let result = merge(base_vault, input.local, &remote.vault);
                    for conflict in &result.conflicts {
                        info!(
                            "Resolved conflict on entry {} in favour of {:?} side",
                            conflict.entry_id, conflict.winner
                        );
                    }
                    if result.vault.same_entries(&remote.vault) {
                        let conflicts = result.conflicts;
                        return Ok(self.fast_forward(input.vault_id, remote, attempts, conflicts));
                    }
                    Candidate {
                        vault: result.vault,
                        expected: Some(remote.token),
                        remote_version: remote.vault.sync_version,
                        kind: SyncKind::Merged,
                        conflicts: result.conflicts,
                        salt: remote.blob.salt,
                        params: remote.blob.kdf_params,
                    }
                }
            };

            if cancel.is_cancelled() {
                info!("Sync of vault {} cancelled before writing", input.vault_id);
                return Err(SyncError::Cancelled);
            }

            let Candidate {
                mut vault,
                expected,
                remote_version,
                kind,
                conflicts,
                salt,
                params,
            } = candidate;
            vault.sync_version = remote_version.max(base_version) + 1;
            let (vault, blob) = seal_blob(keychain, vault, salt, params).await?;
            let bytes = blob.to_bytes()?;

            debug!(
                "Sync {} attempt {}: writing version {}",
                input.vault_id, attempts, vault.sync_version
            );
            match self.write(input.vault_id, expected.as_ref(), bytes).await? {
                Some(token) => {
                    info!(
                        "[{}] Committed vault {} at version {} ({:?}, {} conflicts, {} attempts)",
                        self.config.device_name,
                        input.vault_id,
                        vault.sync_version,
                        kind,
                        conflicts.len(),
                        attempts
                    );
                    let state = SyncState::new(blob, vault.sync_version, token);
                    return Ok(SyncOutcome {
                        kind,
                        attempts,
                        sync_version: vault.sync_version,
                        conflicts,
                        vault,
                        state,
                    });
                }
                None if attempts >= max_attempts => {
                    warn!(
                        "[{}] Giving up on vault {} after {} conflicting writes",
                        self.config.device_name, input.vault_id, attempts
                    );
                    return Err(SyncError::ConflictRetryExhausted { attempts });
                }
                None => {
                    warn!(
                        "Write of vault {} lost a race (attempt {}/{}), refetching",
                        input.vault_id, attempts, max_attempts
                    );
                }
            }
        }
    }

    /// Fetching. A matching head token skips the download.
    async fn observe(
        &self,
        keychain: &Arc<Keychain>,
        vault_id: VaultId,
        known: Option<&VersionToken>,
    ) -> SyncResult<Remote> {
        if let Some(known) = known {
            let head = with_backoff(&self.config.retry, "head", || async move {
                self.store.head(&vault_id).await.map_err(SyncError::from)
            })
            .await?;
            match head {
                None => return Ok(Remote::Absent),
                Some(token) if &token == known => return Ok(Remote::Unchanged(token)),
                Some(_) => {}
            }
        }

        Ok(match self.fetch(keychain, vault_id).await? {
            None => Remote::Absent,
            Some(remote) if Some(&remote.token) == known => Remote::Unchanged(remote.token),
            Some(remote) => Remote::Changed(remote),
        })
    }

    /// Writing. `Ok(None)` means the conditional write lost a race.
    async fn write(
        &self,
        vault_id: VaultId,
        expected: Option<&VersionToken>,
        bytes: Vec<u8>,
    ) -> SyncResult<Option<VersionToken>> {
        with_backoff(&self.config.retry, "write", || {
            let bytes = bytes.clone();
            async move {
                match self.store.put_conditional(&vault_id, expected, bytes).await {
                    Ok(token) => Ok(Some(token)),
                    Err(StoreError::Conflict) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            }
        })
        .await
    }

    fn fast_forward(
        &self,
        vault_id: VaultId,
        remote: RemoteVault,
        attempts: u32,
        conflicts: Vec<ConflictRecord>,
    ) -> SyncOutcome {
        info!(
            "[{}] Fast-forwarded vault {} to remote version {}",
            self.config.device_name, vault_id, remote.vault.sync_version
        );
        let sync_version = remote.vault.sync_version;
        SyncOutcome {
            kind: SyncKind::FastForward,
            attempts,
            sync_version,
            conflicts,
            state: SyncState::new(remote.blob, sync_version, remote.token),
            vault: remote.vault,
        }
    }
}

async fn or_cancel<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = SyncResult<T>>,
) -> SyncResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SyncError::Cancelled),
        result = fut => result,
    }
}

/// Derives the key (or takes it from the keychain cache) and decrypts, off
/// the async runtime.
pub(crate) async fn open_blob(keychain: &Arc<Keychain>, blob: EncryptedBlob) -> SyncResult<Vault> {
    let keychain = Arc::clone(keychain);
    tokio::task::spawn_blocking(move || -> SyncResult<Vault> {
        let key = keychain.key_for(&blob.salt, &blob.kdf_params)?;
        Ok(blob.open(&key)?)
    })
    .await?
}

/// Encrypts `vault` with a fresh nonce, off the async runtime. Hands the
/// vault back alongside its blob.
pub(crate) async fn seal_blob(
    keychain: &Arc<Keychain>,
    vault: Vault,
    salt: Salt,
    params: KdfParams,
) -> SyncResult<(Vault, EncryptedBlob)> {
    let keychain = Arc::clone(keychain);
    tokio::task::spawn_blocking(move || -> SyncResult<(Vault, EncryptedBlob)> {
        let key = keychain.key_for(&salt, &params)?;
        let blob = EncryptedBlob::seal(&vault, &key, salt, params)?;
        Ok((vault, blob))
    })
    .await?
}
