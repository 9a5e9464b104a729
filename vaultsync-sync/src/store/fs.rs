//! Directory-backed blob store.
//!
//! Each vault is one file named after its id. The token is the SHA-256 of
//! the file content, so any writer that changes the bytes changes the
//! token. Conditional writes are serialized by an in-process lock and land
//! through a temp file and rename, so readers never see a partial blob.
//! The lock only covers writers in this process; a directory shared by
//! several processes needs a store with a real compare-and-swap.

use super::{BlobStore, StoreError, StoreResult, VersionToken};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;
use vaultsync_types::VaultId;

/// Configuration for [`FsBlobStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsBlobStoreConfig {
    /// Directory holding one `<vault-id>.vault` file per vault.
    pub root: PathBuf,
}

/// Blob store over a local or mounted directory.
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FsBlobStore {
    pub fn new(config: FsBlobStoreConfig) -> Self {
        Self {
            root: config.root,
            write_lock: Mutex::new(()),
        }
    }

    fn path_for(&self, vault: &VaultId) -> PathBuf {
        self.root.join(format!("{vault}.vault"))
    }

    fn token_for(bytes: &[u8]) -> VersionToken {
        VersionToken::new(hex::encode(Sha256::digest(bytes)))
    }

    async fn read(path: &Path) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn head(&self, vault: &VaultId) -> StoreResult<Option<VersionToken>> {
        let bytes = Self::read(&self.path_for(vault)).await?;
        Ok(bytes.as_deref().map(Self::token_for))
    }

    async fn get(&self, vault: &VaultId) -> StoreResult<Option<(VersionToken, Vec<u8>)>> {
        let bytes = Self::read(&self.path_for(vault)).await?;
        Ok(bytes.map(|b| (Self::token_for(&b), b)))
    }

    async fn put_conditional(
        &self,
        vault: &VaultId,
        expected: Option<&VersionToken>,
        bytes: Vec<u8>,
    ) -> StoreResult<VersionToken> {
        let _guard = self.write_lock.lock().await;
        let path = self.path_for(vault);

        let current = Self::read(&path).await?;
        let current_token = current.as_deref().map(Self::token_for);
        if current_token.as_ref() != expected {
            return Err(StoreError::Conflict);
        }

        fs::create_dir_all(&self.root).await?;
        let tmp = path.with_extension("vault.tmp");
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, &path).await?;

        let token = Self::token_for(&bytes);
        debug!("Wrote {} bytes to {:?} (token {})", bytes.len(), path, token);
        Ok(token)
    }
}
