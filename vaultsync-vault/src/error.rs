//! Error types for the vault layer.

use thiserror::Error;
use vaultsync_crypto::CryptoError;

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

/// Errors that can occur while encoding, decoding or opening a vault.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Key derivation or authentication failure.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The payload was written by a newer build.
    #[error("vault schema version {found} is newer than supported version {supported}")]
    SchemaVersion { found: u32, supported: u32 },

    /// Structurally invalid payload.
    #[error("malformed vault: {0}")]
    Malformed(String),
}
