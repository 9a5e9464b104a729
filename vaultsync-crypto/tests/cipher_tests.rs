use vaultsync_crypto::{
    decrypt, decrypt_with_aad, encrypt, encrypt_with_aad, CryptoError, DerivedKey, EncryptedData,
    NONCE_SIZE, TAG_SIZE,
};

fn random_key() -> DerivedKey {
    DerivedKey::from_bytes(rand::random())
}

#[test]
fn encrypt_decrypt_roundtrip() {
    let key = random_key();
    let plaintext = b"Hello, World!";
    let encrypted = encrypt(&key, plaintext).unwrap();
    let decrypted = decrypt(&key, &encrypted).unwrap();
    assert_eq!(decrypted, plaintext);
}

#[test]
fn encrypt_decrypt_empty() {
    let key = random_key();
    let encrypted = encrypt(&key, b"").unwrap();
    assert_eq!(encrypted.ciphertext.len(), TAG_SIZE);
    assert_eq!(decrypt(&key, &encrypted).unwrap(), b"");
}

#[test]
fn wrong_key_is_authentication_error() {
    let key1 = random_key();
    let key2 = random_key();
    let encrypted = encrypt(&key1, b"Secret").unwrap();
    assert!(matches!(
        decrypt(&key2, &encrypted),
        Err(CryptoError::Authentication)
    ));
}

#[test]
fn tampered_data_is_authentication_error() {
    let key = random_key();
    let mut encrypted = encrypt(&key, b"Secret").unwrap();
    encrypted.ciphertext[0] ^= 0xFF;
    assert!(matches!(
        decrypt(&key, &encrypted),
        Err(CryptoError::Authentication)
    ));
}

#[test]
fn wrong_key_and_tampering_look_identical() {
    let key = random_key();
    let mut tampered = encrypt(&key, b"Secret").unwrap();
    tampered.ciphertext[0] ^= 1;
    let wrong = encrypt(&random_key(), b"Secret").unwrap();

    let a = decrypt(&key, &tampered).unwrap_err().to_string();
    let b = decrypt(&key, &wrong).unwrap_err().to_string();
    assert_eq!(a, b);
}

#[test]
fn truncated_ciphertext_is_authentication_error() {
    let key = random_key();
    let data = EncryptedData {
        nonce: [0u8; NONCE_SIZE],
        ciphertext: vec![1, 2, 3],
    };
    assert!(matches!(decrypt(&key, &data), Err(CryptoError::Authentication)));
}

#[test]
fn same_plaintext_produces_different_ciphertext() {
    let key = random_key();
    let e1 = encrypt(&key, b"Same").unwrap();
    let e2 = encrypt(&key, b"Same").unwrap();
    assert_ne!(e1.nonce, e2.nonce);
    assert_ne!(e1.ciphertext, e2.ciphertext);
}

// ── Associated data ──────────────────────────────────────────────

#[test]
fn aad_roundtrip() {
    let key = random_key();
    let encrypted = encrypt_with_aad(&key, b"payload", b"header").unwrap();
    assert_eq!(
        decrypt_with_aad(&key, &encrypted, b"header").unwrap(),
        b"payload"
    );
}

#[test]
fn aad_mismatch_fails() {
    let key = random_key();
    let encrypted = encrypt_with_aad(&key, b"payload", b"header-v1").unwrap();
    assert!(matches!(
        decrypt_with_aad(&key, &encrypted, b"header-v2"),
        Err(CryptoError::Authentication)
    ));
    assert!(decrypt(&key, &encrypted).is_err());
}

// ── EncryptedData ────────────────────────────────────────────────

#[test]
fn encrypted_data_len() {
    let key = random_key();
    let encrypted = encrypt(&key, b"test").unwrap();
    assert_eq!(encrypted.len(), NONCE_SIZE + 4 + TAG_SIZE);
}

#[test]
fn encrypted_data_is_empty() {
    let ed = EncryptedData {
        nonce: [0u8; NONCE_SIZE],
        ciphertext: vec![],
    };
    assert!(ed.is_empty());
}

#[test]
fn encrypted_data_serde_roundtrip() {
    let key = random_key();
    let encrypted = encrypt(&key, b"test").unwrap();
    let json = serde_json::to_string(&encrypted).unwrap();
    let parsed: EncryptedData = serde_json::from_str(&json).unwrap();
    assert_eq!(encrypted, parsed);
}
