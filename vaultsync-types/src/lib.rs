//! Core type definitions for the vault sync engine.
//!
//! This crate defines the small value types every other crate shares:
//! - Entry, device and vault identifiers (UUID v7)
//! - Monotonic millisecond timestamps used for edit ordering
//!
//! Vault content (entries, logins, notes) lives in `vaultsync-vault`.

mod ids;
mod timestamp;

pub use ids::{DeviceId, EntryId, VaultId};
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
