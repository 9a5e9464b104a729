//! Sources of the master secret.
//!
//! The engine only ever sees secret bytes; how the user produced them (typed
//! password, short PIN, or a key released by the platform after a biometric
//! check) is hidden behind [`SecretProvider`]. Secrets are held in
//! zeroizing buffers and never persisted by this crate.

use crate::error::{CryptoError, CryptoResult};
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

const MIN_PIN_DIGITS: usize = 4;

/// Which kind of provider produced a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    Password,
    Pin,
    Biometric,
}

/// Master secret bytes, wiped on drop.
#[derive(Clone)]
pub struct MasterSecret(Zeroizing<Vec<u8>>);

impl MasterSecret {
    /// Wraps secret bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Returns the secret bytes.
    pub fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterSecret([REDACTED])")
    }
}

/// Produces the master secret fed to key derivation.
pub trait SecretProvider: Send + Sync {
    /// The kind of secret this provider yields.
    fn kind(&self) -> SecretKind;

    /// Produces the secret. May prompt or call into the platform.
    fn secret(&self) -> CryptoResult<MasterSecret>;
}

/// A typed master password.
pub struct PasswordSecret {
    password: Zeroizing<String>,
}

impl PasswordSecret {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: Zeroizing::new(password.into()),
        }
    }
}

impl SecretProvider for PasswordSecret {
    fn kind(&self) -> SecretKind {
        SecretKind::Password
    }

    fn secret(&self) -> CryptoResult<MasterSecret> {
        if self.password.is_empty() {
            return Err(CryptoError::SecretUnavailable(
                "password is empty".to_string(),
            ));
        }
        Ok(MasterSecret::new(self.password.as_bytes().to_vec()))
    }
}

/// A numeric PIN.
pub struct PinSecret {
    pin: Zeroizing<String>,
}

impl PinSecret {
    pub fn new(pin: impl Into<String>) -> Self {
        Self {
            pin: Zeroizing::new(pin.into()),
        }
    }
}

impl SecretProvider for PinSecret {
    fn kind(&self) -> SecretKind {
        SecretKind::Pin
    }

    fn secret(&self) -> CryptoResult<MasterSecret> {
        if self.pin.len() < MIN_PIN_DIGITS || !self.pin.chars().all(|c| c.is_ascii_digit()) {
            return Err(CryptoError::SecretUnavailable(format!(
                "PIN must be at least {MIN_PIN_DIGITS} digits"
            )));
        }
        Ok(MasterSecret::new(self.pin.as_bytes().to_vec()))
    }
}

/// Platform secure storage that releases a stored secret after the user
/// passes a biometric check (Keychain + Touch ID, Android Keystore, ...).
pub trait PlatformKeyStore: Send + Sync {
    /// Prompts as needed and returns the stored secret.
    fn release_secret(&self, prompt: &str) -> CryptoResult<Vec<u8>>;
}

/// Secret released by a [`PlatformKeyStore`].
pub struct BiometricSecret {
    store: Arc<dyn PlatformKeyStore>,
    prompt: String,
}

impl BiometricSecret {
    pub fn new(store: Arc<dyn PlatformKeyStore>, prompt: impl Into<String>) -> Self {
        Self {
            store,
            prompt: prompt.into(),
        }
    }
}

impl SecretProvider for BiometricSecret {
    fn kind(&self) -> SecretKind {
        SecretKind::Biometric
    }

    fn secret(&self) -> CryptoResult<MasterSecret> {
        let bytes = self.store.release_secret(&self.prompt)?;
        if bytes.is_empty() {
            return Err(CryptoError::SecretUnavailable(
                "platform returned an empty secret".to_string(),
            ));
        }
        Ok(MasterSecret::new(bytes))
    }
}
