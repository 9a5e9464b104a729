use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use vaultsync_crypto::{
    derive_key, BiometricSecret, CryptoError, CryptoResult, KdfParams, Keychain, MasterSecret,
    PasswordSecret, PinSecret, PlatformKeyStore, Salt, SecretKind, SecretProvider,
};

struct FakeKeyStore {
    secret: Vec<u8>,
    calls: AtomicUsize,
}

impl PlatformKeyStore for FakeKeyStore {
    fn release_secret(&self, _prompt: &str) -> CryptoResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.secret.is_empty() {
            return Err(CryptoError::SecretUnavailable("user cancelled".into()));
        }
        Ok(self.secret.clone())
    }
}

// ── Providers ────────────────────────────────────────────────────

#[test]
fn password_provider_yields_bytes() {
    let provider = PasswordSecret::new("correct horse");
    assert_eq!(provider.kind(), SecretKind::Password);
    assert_eq!(provider.secret().unwrap().expose(), b"correct horse");
}

#[test]
fn empty_password_is_refused() {
    assert!(PasswordSecret::new("").secret().is_err());
}

#[test]
fn pin_provider_requires_digits() {
    assert_eq!(PinSecret::new("1234").kind(), SecretKind::Pin);
    assert!(PinSecret::new("1234").secret().is_ok());
    assert!(PinSecret::new("12").secret().is_err());
    assert!(PinSecret::new("12ab").secret().is_err());
}

#[test]
fn biometric_provider_calls_platform() {
    let store = Arc::new(FakeKeyStore {
        secret: vec![9; 32],
        calls: AtomicUsize::new(0),
    });
    let provider = BiometricSecret::new(store.clone(), "Unlock vault");
    assert_eq!(provider.kind(), SecretKind::Biometric);
    assert_eq!(provider.secret().unwrap().expose(), &[9u8; 32]);
    assert_eq!(store.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn biometric_cancel_surfaces_error() {
    let store = Arc::new(FakeKeyStore {
        secret: vec![],
        calls: AtomicUsize::new(0),
    });
    let provider = BiometricSecret::new(store, "Unlock vault");
    assert!(matches!(
        provider.secret(),
        Err(CryptoError::SecretUnavailable(_))
    ));
}

#[test]
fn master_secret_debug_is_redacted() {
    let secret = MasterSecret::new(b"hunter2".to_vec());
    assert_eq!(format!("{secret:?}"), "MasterSecret([REDACTED])");
}

// ── Keychain ─────────────────────────────────────────────────────

#[test]
fn keychain_matches_direct_derivation() {
    let salt = Salt::random();
    let params = KdfParams::insecure_for_tests();
    let keychain = Keychain::from_provider(&PasswordSecret::new("pw")).unwrap();

    let via_keychain = keychain.key_for(&salt, &params).unwrap();
    let direct = derive_key(b"pw", &salt, &params).unwrap();
    assert_eq!(via_keychain.as_bytes(), direct.as_bytes());
}

#[test]
fn keychain_caches_per_salt() {
    let salt = Salt::random();
    let params = KdfParams::insecure_for_tests();
    let keychain = Keychain::new(MasterSecret::new(b"pw".to_vec()));

    assert!(keychain.cached(&salt, &params).is_none());
    keychain.key_for(&salt, &params).unwrap();
    assert!(keychain.cached(&salt, &params).is_some());
    assert!(keychain.cached(&Salt::random(), &params).is_none());
}

#[test]
fn keychain_propagates_bad_params() {
    let keychain = Keychain::new(MasterSecret::new(b"pw".to_vec()));
    let params = KdfParams {
        memory_cost: 64,
        time_cost: 1,
        parallelism: 1,
    };
    assert!(keychain.key_for(&Salt::random(), &params).is_err());
}
