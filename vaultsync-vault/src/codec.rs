//! Plaintext encoding of a [`Vault`].
//!
//! The payload is JSON with entries written as an array sorted by id, so the
//! same vault always encodes to the same bytes. Decoding checks the schema
//! version before anything else: a payload from a newer build is refused
//! with [`VaultError::SchemaVersion`] instead of being half-understood.

use crate::error::{VaultError, VaultResult};
use crate::model::{Entry, Vault};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Highest schema version this build reads and the version it writes.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct VaultDocumentRef<'a> {
    schema_version: u32,
    sync_version: u64,
    entries: Vec<&'a Entry>,
}

#[derive(Deserialize)]
struct VaultHeader {
    schema_version: u32,
}

#[derive(Deserialize)]
struct VaultDocument {
    schema_version: u32,
    sync_version: u64,
    entries: Vec<Entry>,
}

/// Encodes a vault to its plaintext payload.
pub fn serialize(vault: &Vault) -> VaultResult<Vec<u8>> {
    let doc = VaultDocumentRef {
        schema_version: vault.schema_version,
        sync_version: vault.sync_version,
        entries: vault.entries().collect(),
    };
    serde_json::to_vec(&doc).map_err(|e| VaultError::Malformed(e.to_string()))
}

/// Decodes a plaintext payload.
///
/// Fails with [`VaultError::SchemaVersion`] for payloads newer than
/// [`SCHEMA_VERSION`] and with [`VaultError::Malformed`] for invalid JSON,
/// missing fields or duplicate entry ids.
pub fn deserialize(bytes: &[u8]) -> VaultResult<Vault> {
    let header: VaultHeader = serde_json::from_slice(bytes)
        .map_err(|e| VaultError::Malformed(format!("unreadable header: {e}")))?;
    if header.schema_version > SCHEMA_VERSION {
        return Err(VaultError::SchemaVersion {
            found: header.schema_version,
            supported: SCHEMA_VERSION,
        });
    }
    if header.schema_version == 0 {
        return Err(VaultError::Malformed("schema version 0".to_string()));
    }

    let doc: VaultDocument =
        serde_json::from_slice(bytes).map_err(|e| VaultError::Malformed(e.to_string()))?;

    let mut seen = BTreeSet::new();
    for entry in &doc.entries {
        if !seen.insert(entry.id) {
            return Err(VaultError::Malformed(format!(
                "duplicate entry id {}",
                entry.id
            )));
        }
    }

    Ok(Vault::from_entries(
        doc.schema_version,
        doc.sync_version,
        doc.entries,
    ))
}
