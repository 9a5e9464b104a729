//! Remote blob storage.
//!
//! The remote vault is a single opaque object per vault id. The only
//! coordination primitive between devices is [`BlobStore::put_conditional`]:
//! a write succeeds only if the object still carries the token the writer
//! last observed.

mod fs;
mod memory;

pub use fs::{FsBlobStore, FsBlobStoreConfig};
pub use memory::MemoryBlobStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use vaultsync_types::VaultId;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by a [`BlobStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The object changed (or appeared) since the expected token.
    #[error("remote object changed since it was read")]
    Conflict,

    /// Transient transport failure.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Opaque version of a remote object. Equal tokens mean equal content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Conditional-write object storage holding one encrypted blob per vault.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns the current token, or `None` if no object exists.
    async fn head(&self, vault: &VaultId) -> StoreResult<Option<VersionToken>>;

    /// Returns the current token and bytes.
    async fn get(&self, vault: &VaultId) -> StoreResult<Option<(VersionToken, Vec<u8>)>>;

    /// Replaces the object if its token is still `expected`. With
    /// `expected = None` the write only succeeds if no object exists.
    /// Returns the new token, or [`StoreError::Conflict`].
    async fn put_conditional(
        &self,
        vault: &VaultId,
        expected: Option<&VersionToken>,
        bytes: Vec<u8>,
    ) -> StoreResult<VersionToken>;
}
