//! Property-based tests for the crypto module.
//!
//! These tests verify security properties that must always hold:
//! - Encryption is reversible with the correct key
//! - Wrong keys fail decryption
//! - Flipping any bit of nonce, ciphertext or tag is detected
//! - Keys are derived deterministically from secrets

use proptest::prelude::*;
use vaultsync_crypto::{
    decrypt, decrypt_with_aad, derive_key, encrypt, encrypt_with_aad, CryptoError, DerivedKey,
    KdfParams, Salt, KEY_SIZE, NONCE_SIZE, TAG_SIZE,
};

fn random_key() -> DerivedKey {
    DerivedKey::from_bytes(rand::random())
}

fn salt_strategy() -> impl Strategy<Value = Salt> {
    prop::array::uniform16(any::<u8>()).prop_map(Salt::from_bytes)
}

fn plaintext_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..4096)
}

fn secret_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..64)
}

mod encryption_properties {
    use super::*;

    proptest! {
        #[test]
        fn roundtrip_preserves_data(plaintext in plaintext_strategy()) {
            let key = random_key();
            let encrypted = encrypt(&key, &plaintext).unwrap();
            prop_assert_eq!(decrypt(&key, &encrypted).unwrap(), plaintext);
        }

        #[test]
        fn ciphertext_includes_auth_tag(plaintext in plaintext_strategy()) {
            let key = random_key();
            let encrypted = encrypt(&key, &plaintext).unwrap();
            prop_assert_eq!(encrypted.ciphertext.len(), plaintext.len() + TAG_SIZE);
        }

        #[test]
        fn wrong_key_fails_decryption(plaintext in plaintext_strategy()) {
            let encrypted = encrypt(&random_key(), &plaintext).unwrap();
            let result = decrypt(&random_key(), &encrypted);
            prop_assert!(matches!(result, Err(CryptoError::Authentication)));
        }
    }
}

mod tamper_properties {
    use super::*;

    proptest! {
        /// Any single flipped bit in ciphertext or tag is caught.
        #[test]
        fn flipped_ciphertext_bit_fails(
            plaintext in prop::collection::vec(any::<u8>(), 0..256),
            position in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let key = random_key();
            let mut encrypted = encrypt(&key, &plaintext).unwrap();
            let idx = position.index(encrypted.ciphertext.len());
            encrypted.ciphertext[idx] ^= 1 << bit;
            prop_assert!(matches!(decrypt(&key, &encrypted), Err(CryptoError::Authentication)));
        }

        #[test]
        fn flipped_nonce_bit_fails(
            plaintext in prop::collection::vec(any::<u8>(), 1..256),
            idx in 0..NONCE_SIZE,
            bit in 0u8..8,
        ) {
            let key = random_key();
            let mut encrypted = encrypt(&key, &plaintext).unwrap();
            encrypted.nonce[idx] ^= 1 << bit;
            prop_assert!(decrypt(&key, &encrypted).is_err());
        }

        #[test]
        fn flipped_aad_bit_fails(
            aad in prop::collection::vec(any::<u8>(), 1..64),
            position in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let key = random_key();
            let encrypted = encrypt_with_aad(&key, b"vault", &aad).unwrap();
            let mut altered = aad.clone();
            let idx = position.index(altered.len());
            altered[idx] ^= 1 << bit;
            prop_assert!(decrypt_with_aad(&key, &encrypted, &altered).is_err());
        }
    }
}

mod key_derivation_properties {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn derivation_is_deterministic(secret in secret_strategy(), salt in salt_strategy()) {
            let params = KdfParams::insecure_for_tests();
            let k1 = derive_key(&secret, &salt, &params).unwrap();
            let k2 = derive_key(&secret, &salt, &params).unwrap();
            prop_assert_eq!(k1.as_bytes(), k2.as_bytes());
            prop_assert_eq!(k1.as_bytes().len(), KEY_SIZE);
        }

        #[test]
        fn different_salts_different_keys(
            secret in secret_strategy(),
            salt1 in salt_strategy(),
            salt2 in salt_strategy(),
        ) {
            prop_assume!(salt1 != salt2);
            let params = KdfParams::insecure_for_tests();
            let k1 = derive_key(&secret, &salt1, &params).unwrap();
            let k2 = derive_key(&secret, &salt2, &params).unwrap();
            prop_assert_ne!(k1.as_bytes(), k2.as_bytes());
        }

        #[test]
        fn memory_below_floor_always_rejected(memory in 0u32..8192) {
            let params = KdfParams { memory_cost: memory, time_cost: 1, parallelism: 1 };
            prop_assert!(params.validate().is_err());
        }
    }
}
