//! The encrypted vault envelope.
//!
//! An [`EncryptedBlob`] carries everything needed to open it except the
//! master secret: schema and KDF versions, Argon2 costs, salt, nonce and the
//! ciphertext with its tag. The header fields are bound into the AEAD tag as
//! associated data, so editing any of them is caught as an authentication
//! failure just like editing the ciphertext.
//!
//! On the wire the blob is a small JSON object with base64 byte fields.

use crate::codec::{self, SCHEMA_VERSION};
use crate::error::{VaultError, VaultResult};
use crate::model::Vault;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use vaultsync_crypto::{
    decrypt_with_aad, encrypt_with_aad, CryptoError, DerivedKey, EncryptedData, KdfParams, Salt,
    KDF_VERSION, NONCE_SIZE,
};

const AAD_DOMAIN: &[u8] = b"vaultsync.blob";

/// Authenticated, versioned ciphertext of a vault.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireBlob", into = "WireBlob")]
pub struct EncryptedBlob {
    pub schema_version: u32,
    pub kdf_version: u8,
    pub kdf_params: KdfParams,
    pub salt: Salt,
    pub nonce: [u8; NONCE_SIZE],
    /// Ciphertext followed by the 16-byte tag.
    pub ciphertext: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct WireBlob {
    schema_version: u32,
    kdf_version: u8,
    kdf_params: KdfParams,
    salt: String,
    nonce: String,
    ciphertext: String,
}

impl EncryptedBlob {
    /// Encrypts `vault` under `key`, which must have been derived with
    /// `salt` and `params`. A fresh nonce is drawn on every call.
    pub fn seal(
        vault: &Vault,
        key: &DerivedKey,
        salt: Salt,
        params: KdfParams,
    ) -> VaultResult<Self> {
        let plaintext = codec::serialize(vault)?;
        let aad = header_aad(vault.schema_version, KDF_VERSION, &params, &salt);
        let EncryptedData { nonce, ciphertext } = encrypt_with_aad(key, &plaintext, &aad)?;
        Ok(Self {
            schema_version: vault.schema_version,
            kdf_version: KDF_VERSION,
            kdf_params: params,
            salt,
            nonce,
            ciphertext,
        })
    }

    /// Refuses blobs written by a newer build before any key work happens.
    pub fn check_supported(&self) -> VaultResult<()> {
        if self.schema_version > SCHEMA_VERSION {
            return Err(VaultError::SchemaVersion {
                found: self.schema_version,
                supported: SCHEMA_VERSION,
            });
        }
        if self.kdf_version != KDF_VERSION {
            return Err(VaultError::Crypto(CryptoError::KeyDerivation(format!(
                "unsupported kdf version {}",
                self.kdf_version
            ))));
        }
        self.kdf_params.validate()?;
        Ok(())
    }

    /// Decrypts and decodes the vault.
    pub fn open(&self, key: &DerivedKey) -> VaultResult<Vault> {
        self.check_supported()?;
        let aad = header_aad(self.schema_version, self.kdf_version, &self.kdf_params, &self.salt);
        let data = EncryptedData {
            nonce: self.nonce,
            ciphertext: self.ciphertext.clone(),
        };
        let plaintext = decrypt_with_aad(key, &data, &aad)?;
        let vault = codec::deserialize(&plaintext)?;
        if vault.schema_version != self.schema_version {
            return Err(VaultError::Malformed(format!(
                "header schema {} does not match payload schema {}",
                self.schema_version, vault.schema_version
            )));
        }
        Ok(vault)
    }

    /// Encodes the blob for storage or upload.
    pub fn to_bytes(&self) -> VaultResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| VaultError::Malformed(e.to_string()))
    }

    /// Decodes a blob produced by [`EncryptedBlob::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> VaultResult<Self> {
        let wire: WireBlob = serde_json::from_slice(bytes)
            .map_err(|e| VaultError::Malformed(format!("unreadable blob: {e}")))?;
        Self::try_from(wire)
    }
}

impl From<EncryptedBlob> for WireBlob {
    fn from(blob: EncryptedBlob) -> Self {
        Self {
            schema_version: blob.schema_version,
            kdf_version: blob.kdf_version,
            kdf_params: blob.kdf_params,
            salt: STANDARD.encode(blob.salt.as_bytes()),
            nonce: STANDARD.encode(blob.nonce),
            ciphertext: STANDARD.encode(&blob.ciphertext),
        }
    }
}

impl TryFrom<WireBlob> for EncryptedBlob {
    type Error = VaultError;

    fn try_from(wire: WireBlob) -> VaultResult<Self> {
        let salt = decode_field("salt", &wire.salt)?;
        let salt = Salt::from_slice(&salt)
            .map_err(|_| VaultError::Malformed("salt has wrong length".to_string()))?;
        let nonce: [u8; NONCE_SIZE] = decode_field("nonce", &wire.nonce)?
            .try_into()
            .map_err(|_| VaultError::Malformed("nonce has wrong length".to_string()))?;

        Ok(EncryptedBlob {
            schema_version: wire.schema_version,
            kdf_version: wire.kdf_version,
            kdf_params: wire.kdf_params,
            salt,
            nonce,
            ciphertext: decode_field("ciphertext", &wire.ciphertext)?,
        })
    }
}

fn decode_field(name: &str, value: &str) -> VaultResult<Vec<u8>> {
    STANDARD
        .decode(value)
        .map_err(|e| VaultError::Malformed(format!("invalid base64 in {name}: {e}")))
}

fn header_aad(schema_version: u32, kdf_version: u8, params: &KdfParams, salt: &Salt) -> Vec<u8> {
    let mut aad = Vec::with_capacity(AAD_DOMAIN.len() + 17 + salt.as_bytes().len());
    aad.extend_from_slice(AAD_DOMAIN);
    aad.extend_from_slice(&schema_version.to_le_bytes());
    aad.push(kdf_version);
    aad.extend_from_slice(&params.memory_cost.to_le_bytes());
    aad.extend_from_slice(&params.time_cost.to_le_bytes());
    aad.extend_from_slice(&params.parallelism.to_le_bytes());
    aad.extend_from_slice(salt.as_bytes());
    aad
}
