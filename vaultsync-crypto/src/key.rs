//! Key derivation and management.
//!
//! Uses Argon2id (v0x13) for deriving the vault key from a master secret.
//! Cost parameters travel with every encrypted blob, so they are validated
//! before use: a blob asking for less work than the floor is refused rather
//! than derived with weaker settings.

use crate::error::{CryptoError, CryptoResult};
use argon2::{Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of encryption keys in bytes (256 bits for ChaCha20).
pub const KEY_SIZE: usize = 32;

/// Size of salt in bytes.
pub const SALT_SIZE: usize = 16;

/// Identifier of the key derivation scheme written into blob headers.
/// Version 1 is Argon2id v0x13 with a 32-byte output.
pub const KDF_VERSION: u8 = 1;

const MIN_MEMORY_KIB: u32 = 8 * 1024;
const MAX_MEMORY_KIB: u32 = 4 * 1024 * 1024;
const MIN_TIME_COST: u32 = 1;
const MAX_TIME_COST: u32 = 16;
const MIN_PARALLELISM: u32 = 1;
const MAX_PARALLELISM: u32 = 16;

/// A derived encryption key with automatic zeroization on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Creates a key from a slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let array: [u8; KEY_SIZE] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: KEY_SIZE,
                    actual: bytes.len(),
                })?;
        Ok(Self::from_bytes(array))
    }

    /// Returns the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Salt for key derivation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Salt {
    bytes: [u8; SALT_SIZE],
}

impl Salt {
    /// Generates a random salt.
    pub fn random() -> Self {
        let mut bytes = [0u8; SALT_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Creates a salt from raw bytes.
    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self { bytes }
    }

    /// Creates a salt from a slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let array: [u8; SALT_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::KeyDerivation(format!(
                "salt must be {SALT_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self::from_bytes(array))
    }

    /// Returns the salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.bytes
    }
}

/// Argon2id cost parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Time cost (iterations).
    pub time_cost: u32,
    /// Parallelism factor.
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        // OWASP recommendation for Argon2id (2023)
        Self {
            memory_cost: 19 * 1024,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// The cheapest parameters still accepted by [`KdfParams::validate`].
    /// Meant for tests and development fixtures.
    pub fn insecure_for_tests() -> Self {
        Self {
            memory_cost: MIN_MEMORY_KIB,
            time_cost: MIN_TIME_COST,
            parallelism: MIN_PARALLELISM,
        }
    }

    /// Checks every cost against its supported range.
    pub fn validate(&self) -> CryptoResult<()> {
        check_range("memory_cost", self.memory_cost, MIN_MEMORY_KIB, MAX_MEMORY_KIB)?;
        check_range("time_cost", self.time_cost, MIN_TIME_COST, MAX_TIME_COST)?;
        check_range("parallelism", self.parallelism, MIN_PARALLELISM, MAX_PARALLELISM)?;
        // Argon2 needs at least 8 KiB per lane.
        if self.memory_cost < 8 * self.parallelism {
            return Err(CryptoError::KeyDerivation(
                "memory_cost too small for parallelism".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_range(name: &str, value: u32, min: u32, max: u32) -> CryptoResult<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(CryptoError::KeyDerivation(format!(
            "{name} {value} outside supported range {min}..={max}"
        )))
    }
}

/// Derives an encryption key from a master secret using Argon2id.
///
/// Deterministic: the same secret, salt and parameters always give the same
/// key. Fails with [`CryptoError::KeyDerivation`] when `params` are out of
/// bounds.
pub fn derive_key(secret: &[u8], salt: &Salt, params: &KdfParams) -> CryptoResult<DerivedKey> {
    params.validate()?;

    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key_bytes = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(secret, salt.as_bytes(), &mut key_bytes)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let key = DerivedKey::from_bytes(key_bytes);
    key_bytes.zeroize();
    Ok(key)
}
