//! An unlocked master secret plus the keys derived from it.
//!
//! Local and remote blobs of one vault normally share a salt, so a sync round
//! would otherwise run Argon2 several times for the same key.

use crate::error::CryptoResult;
use crate::key::{derive_key, DerivedKey, KdfParams, Salt};
use crate::secret::{MasterSecret, SecretProvider};
use std::collections::HashMap;
use std::sync::Mutex;

/// Holds the master secret for an unlocked session.
pub struct Keychain {
    secret: MasterSecret,
    derived: Mutex<HashMap<(Salt, KdfParams), DerivedKey>>,
}

impl Keychain {
    /// Creates a keychain around an already obtained secret.
    pub fn new(secret: MasterSecret) -> Self {
        Self {
            secret,
            derived: Mutex::new(HashMap::new()),
        }
    }

    /// Obtains the secret from a provider.
    pub fn from_provider(provider: &dyn SecretProvider) -> CryptoResult<Self> {
        Ok(Self::new(provider.secret()?))
    }

    /// Returns the key for `salt`/`params`, deriving it on first use.
    pub fn key_for(&self, salt: &Salt, params: &KdfParams) -> CryptoResult<DerivedKey> {
        if let Some(key) = self.cached(salt, params) {
            return Ok(key);
        }
        let key = derive_key(self.secret.expose(), salt, params)?;
        self.derived
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert((*salt, *params), key.clone());
        Ok(key)
    }

    /// Returns a previously derived key without running the KDF.
    pub fn cached(&self, salt: &Salt, params: &KdfParams) -> Option<DerivedKey> {
        self.derived
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&(*salt, *params))
            .cloned()
    }
}

impl std::fmt::Debug for Keychain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keychain").finish_non_exhaustive()
    }
}
