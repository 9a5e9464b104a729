//! Error types for the encryption layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key derivation parameters rejected or derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// The authentication tag did not verify.
    ///
    /// Wrong key, corrupted bytes and tampering all surface as this one
    /// variant with no detail attached.
    #[error("authentication failed")]
    Authentication,

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// The secret provider could not produce a secret.
    #[error("secret unavailable: {0}")]
    SecretUnavailable(String),
}
