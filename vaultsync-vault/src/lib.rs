//! Vault data model and its at-rest representation.
//!
//! - [`model`]: entries, logins and the [`Vault`] aggregate
//! - [`codec`]: deterministic, versioned JSON encoding of a vault
//! - [`blob`]: the [`EncryptedBlob`] envelope that is stored locally and
//!   uploaded to the blob store
//!
//! Plaintext flows one way on write (`Vault` → codec → cipher → blob) and
//! the reverse on read.

pub mod blob;
pub mod codec;
mod error;
pub mod model;

pub use blob::EncryptedBlob;
pub use codec::{deserialize, serialize, SCHEMA_VERSION};
pub use error::{VaultError, VaultResult};
pub use model::{Entry, EntryType, Login, Vault};
