//! Encryption layer for the vault sync engine.
//!
//! - [`derive_key`]: Argon2id over the user's master secret, with cost
//!   parameters validated against a security floor
//! - [`encrypt`] / [`decrypt`]: ChaCha20-Poly1305 AEAD with a fresh random
//!   96-bit nonce per call
//! - [`SecretProvider`]: password, PIN and platform-biometric sources of the
//!   master secret
//! - [`Keychain`]: an unlocked secret plus a cache of keys derived from it
//!
//! Nothing in this crate logs, and key types redact themselves in `Debug`.

mod cipher;
mod error;
mod key;
mod keychain;
mod secret;

pub use cipher::{
    decrypt, decrypt_with_aad, encrypt, encrypt_with_aad, EncryptedData, NONCE_SIZE, TAG_SIZE,
};
pub use error::{CryptoError, CryptoResult};
pub use key::{
    derive_key, DerivedKey, KdfParams, Salt, KDF_VERSION, KEY_SIZE,
    SALT_SIZE,
};
pub use keychain::Keychain;
pub use secret::{
    BiometricSecret, MasterSecret, PasswordSecret, PinSecret, PlatformKeyStore, SecretKind,
    SecretProvider,
};
