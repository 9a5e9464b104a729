//! In-process blob store.

use super::{BlobStore, StoreError, StoreResult, VersionToken};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use vaultsync_types::VaultId;

#[derive(Debug, Default)]
struct Inner {
    /// Bumped on every successful write across all vaults, so a token is
    /// never handed out twice.
    generation: u64,
    objects: HashMap<VaultId, (VersionToken, Vec<u8>)>,
}

/// Blob store held in memory. Tokens are write generations.
///
/// Useful for tests and for devices sharing one process.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    inner: Mutex<Inner>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally replaces the object, as another writer that ignores
    /// tokens would.
    pub fn overwrite(&self, vault: &VaultId, bytes: Vec<u8>) -> VersionToken {
        let mut inner = self.lock();
        let token = inner.next_token();
        inner.objects.insert(*vault, (token.clone(), bytes));
        token
    }

    /// Raw bytes of the stored object.
    pub fn bytes(&self, vault: &VaultId) -> Option<Vec<u8>> {
        self.lock().objects.get(vault).map(|(_, b)| b.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Inner {
    fn next_token(&mut self) -> VersionToken {
        self.generation += 1;
        VersionToken::new(format!("gen-{}", self.generation))
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn head(&self, vault: &VaultId) -> StoreResult<Option<VersionToken>> {
        Ok(self.lock().objects.get(vault).map(|(t, _)| t.clone()))
    }

    async fn get(&self, vault: &VaultId) -> StoreResult<Option<(VersionToken, Vec<u8>)>> {
        Ok(self.lock().objects.get(vault).cloned())
    }

    async fn put_conditional(
        &self,
        vault: &VaultId,
        expected: Option<&VersionToken>,
        bytes: Vec<u8>,
    ) -> StoreResult<VersionToken> {
        let mut inner = self.lock();
        let current = inner.objects.get(vault).map(|(t, _)| t);
        if current != expected {
            return Err(StoreError::Conflict);
        }
        let token = inner.next_token();
        inner.objects.insert(*vault, (token.clone(), bytes));
        Ok(token)
    }
}
