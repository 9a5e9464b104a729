//! Shared test helpers for sync tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use vaultsync_crypto::{KdfParams, PasswordSecret};
use vaultsync_sync::{
    BlobStore, LocalStore, MemoryBlobStore, MemoryLocalStore, StoreError, StoreResult,
    SyncConfig, SyncLocks, VaultSession, VersionToken,
};
use vaultsync_types::{DeviceId, VaultId};
use vaultsync_vault::{Entry, Login};

pub const PASSWORD: &str = "correct horse battery staple";

/// Routes sync logs to the test output. Set `RUST_LOG=vaultsync_sync=debug`
/// to see state transitions.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Default config with cheap Argon2 costs.
pub fn config() -> SyncConfig {
    SyncConfig {
        kdf: KdfParams::insecure_for_tests(),
        ..Default::default()
    }
}

pub fn password() -> PasswordSecret {
    PasswordSecret::new(PASSWORD)
}

pub fn login(name: &str, username: &str, password: &str) -> Entry {
    Entry::new_login(name, Login::new(username, password), DeviceId::new())
}

pub fn session(
    vault_id: VaultId,
    remote: Arc<dyn BlobStore>,
    local: Arc<dyn LocalStore>,
) -> VaultSession {
    VaultSession::new(
        vault_id,
        DeviceId::new(),
        remote,
        local,
        SyncLocks::new(),
        config(),
    )
}

/// A device that creates the vault locally.
pub async fn founder(vault_id: VaultId, remote: Arc<dyn BlobStore>) -> VaultSession {
    init_tracing();
    let mut s = session(vault_id, remote, Arc::new(MemoryLocalStore::new()));
    s.create_vault(&password()).await.unwrap();
    s
}

/// A device that joins an existing remote vault.
pub async fn joiner(vault_id: VaultId, remote: Arc<dyn BlobStore>) -> VaultSession {
    let mut s = session(vault_id, remote, Arc::new(MemoryLocalStore::new()));
    s.unlock(&password()).await.unwrap();
    s
}

/// Fails the next `failures` calls with a transient error.
pub struct FlakyStore {
    pub inner: Arc<MemoryBlobStore>,
    failures: AtomicUsize,
    pub calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: Arc<MemoryBlobStore>, failures: usize) -> Self {
        Self {
            inner,
            failures: AtomicUsize::new(failures),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let left = self.failures.load(Ordering::SeqCst);
        if left > 0 {
            self.failures.store(left - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for FlakyStore {
    async fn head(&self, vault: &VaultId) -> StoreResult<Option<VersionToken>> {
        self.check()?;
        self.inner.head(vault).await
    }

    async fn get(&self, vault: &VaultId) -> StoreResult<Option<(VersionToken, Vec<u8>)>> {
        self.check()?;
        self.inner.get(vault).await
    }

    async fn put_conditional(
        &self,
        vault: &VaultId,
        expected: Option<&VersionToken>,
        bytes: Vec<u8>,
    ) -> StoreResult<VersionToken> {
        self.check()?;
        self.inner.put_conditional(vault, expected, bytes).await
    }
}

/// Pauses the first write until released, so a test can act while the
/// writer is between its fetch and its conditional put.
pub struct GatedStore {
    pub inner: Arc<MemoryBlobStore>,
    armed: AtomicBool,
    pub reached: Notify,
    pub release: Notify,
}

impl GatedStore {
    pub fn new(inner: Arc<MemoryBlobStore>) -> Self {
        Self {
            inner,
            armed: AtomicBool::new(true),
            reached: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl BlobStore for GatedStore {
    async fn head(&self, vault: &VaultId) -> StoreResult<Option<VersionToken>> {
        self.inner.head(vault).await
    }

    async fn get(&self, vault: &VaultId) -> StoreResult<Option<(VersionToken, Vec<u8>)>> {
        self.inner.get(vault).await
    }

    async fn put_conditional(
        &self,
        vault: &VaultId,
        expected: Option<&VersionToken>,
        bytes: Vec<u8>,
    ) -> StoreResult<VersionToken> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.reached.notify_one();
            self.release.notified().await;
        }
        self.inner.put_conditional(vault, expected, bytes).await
    }
}

/// Loses every write: before answering `Conflict` it rewrites the current
/// object so its token moves, as if another device committed in between.
pub struct ContendedStore {
    pub inner: Arc<MemoryBlobStore>,
    pub puts: AtomicUsize,
}

impl ContendedStore {
    pub fn new(inner: Arc<MemoryBlobStore>) -> Self {
        Self {
            inner,
            puts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BlobStore for ContendedStore {
    async fn head(&self, vault: &VaultId) -> StoreResult<Option<VersionToken>> {
        self.inner.head(vault).await
    }

    async fn get(&self, vault: &VaultId) -> StoreResult<Option<(VersionToken, Vec<u8>)>> {
        self.inner.get(vault).await
    }

    async fn put_conditional(
        &self,
        vault: &VaultId,
        _expected: Option<&VersionToken>,
        _bytes: Vec<u8>,
    ) -> StoreResult<VersionToken> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if let Some(current) = self.inner.bytes(vault) {
            self.inner.overwrite(vault, current);
        }
        Err(StoreError::Conflict)
    }
}

/// Commits the first write once armed but reports it as failed, as if the
/// acknowledgement was lost on the way back.
pub struct LostAckStore {
    pub inner: Arc<MemoryBlobStore>,
    armed: AtomicBool,
    pub puts: AtomicUsize,
}

impl LostAckStore {
    pub fn new(inner: Arc<MemoryBlobStore>) -> Self {
        Self {
            inner,
            armed: AtomicBool::new(false),
            puts: AtomicUsize::new(0),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlobStore for LostAckStore {
    async fn head(&self, vault: &VaultId) -> StoreResult<Option<VersionToken>> {
        self.inner.head(vault).await
    }

    async fn get(&self, vault: &VaultId) -> StoreResult<Option<(VersionToken, Vec<u8>)>> {
        self.inner.get(vault).await
    }

    async fn put_conditional(
        &self,
        vault: &VaultId,
        expected: Option<&VersionToken>,
        bytes: Vec<u8>,
    ) -> StoreResult<VersionToken> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let token = self.inner.put_conditional(vault, expected, bytes).await?;
        if self.armed.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        Ok(token)
    }
}

/// Fails every call with a local I/O error.
#[derive(Default)]
pub struct BrokenDiskStore {
    pub calls: AtomicUsize,
}

impl BrokenDiskStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail(&self) -> StoreError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "permission denied",
        ))
    }
}

#[async_trait]
impl BlobStore for BrokenDiskStore {
    async fn head(&self, _vault: &VaultId) -> StoreResult<Option<VersionToken>> {
        Err(self.fail())
    }

    async fn get(&self, _vault: &VaultId) -> StoreResult<Option<(VersionToken, Vec<u8>)>> {
        Err(self.fail())
    }

    async fn put_conditional(
        &self,
        _vault: &VaultId,
        _expected: Option<&VersionToken>,
        _bytes: Vec<u8>,
    ) -> StoreResult<VersionToken> {
        Err(self.fail())
    }
}
