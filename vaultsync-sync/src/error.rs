//! Error types for the sync layer.

use crate::store::StoreError;
use thiserror::Error;
use vaultsync_crypto::CryptoError;
use vaultsync_types::EntryId;
use vaultsync_vault::VaultError;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync and session operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The secret could not be turned into a key, or the KDF settings of a
    /// blob are out of bounds.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Wrong secret, or the blob was corrupted or tampered with.
    #[error("authentication failed")]
    Authentication,

    /// The remote vault uses a schema this build does not read.
    #[error("vault schema version {found} not supported (supported: {supported})")]
    SchemaVersion { found: u32, supported: u32 },

    /// The decrypted payload is structurally invalid.
    #[error("malformed vault: {0}")]
    MalformedVault(String),

    /// The blob store could not be reached. Retried with backoff before it
    /// is surfaced.
    #[error("network error: {0}")]
    Network(String),

    /// Every conditional write lost a race.
    #[error("remote kept changing: gave up after {attempts} attempts")]
    ConflictRetryExhausted { attempts: u32 },

    /// The caller cancelled before the write was issued.
    #[error("sync cancelled")]
    Cancelled,

    /// Any other crypto failure.
    #[error(transparent)]
    Crypto(CryptoError),

    /// The session has no unlocked vault.
    #[error("vault is locked")]
    Locked,

    /// No vault exists locally or remotely.
    #[error("vault not found")]
    VaultNotFound,

    /// `create_vault` on a vault that already has local state.
    #[error("vault already exists")]
    VaultExists,

    /// Missing or tombstoned entry.
    #[error("entry not found: {0}")]
    EntryNotFound(EntryId),

    /// `add_entry` with an id the vault already holds, tombstones included.
    #[error("entry already exists: {0}")]
    EntryExists(EntryId),

    /// Local disk access failed, for local state or a directory-backed
    /// store.
    #[error("local storage error: {0}")]
    Io(#[from] std::io::Error),

    /// Local snapshot could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A blocking task panicked.
    #[error("background task failed: {0}")]
    Task(String),
}

impl SyncError {
    /// True for failures worth retrying with backoff. Crypto and schema
    /// errors never are.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Network(_))
    }
}

impl From<CryptoError> for SyncError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Authentication => SyncError::Authentication,
            CryptoError::KeyDerivation(msg) => SyncError::KeyDerivation(msg),
            other => SyncError::Crypto(other),
        }
    }
}

impl From<VaultError> for SyncError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::Crypto(e) => e.into(),
            VaultError::SchemaVersion { found, supported } => {
                SyncError::SchemaVersion { found, supported }
            }
            VaultError::Malformed(msg) => SyncError::MalformedVault(msg),
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io(e) => SyncError::Io(e),
            // Conflict is consumed by the writer; one reaching here is a
            // store that answered a read with it.
            other @ (StoreError::Unavailable(_) | StoreError::Conflict) => {
                SyncError::Network(other.to_string())
            }
        }
    }
}

impl From<tokio::task::JoinError> for SyncError {
    fn from(err: tokio::task::JoinError) -> Self {
        SyncError::Task(err.to_string())
    }
}
