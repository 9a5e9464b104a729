use vaultsync_crypto::CryptoError;

#[test]
fn error_display_key_derivation() {
    let err = CryptoError::KeyDerivation("bad params".into());
    assert!(err.to_string().contains("key derivation failed"));
    assert!(err.to_string().contains("bad params"));
}

#[test]
fn error_display_authentication_has_no_detail() {
    assert_eq!(CryptoError::Authentication.to_string(), "authentication failed");
}

#[test]
fn error_display_invalid_key_length() {
    let msg = CryptoError::InvalidKeyLength {
        expected: 32,
        actual: 16,
    }
    .to_string();
    assert!(msg.contains("32"));
    assert!(msg.contains("16"));
}

#[test]
fn error_display_secret_unavailable() {
    let err = CryptoError::SecretUnavailable("cancelled".into());
    assert!(err.to_string().contains("cancelled"));
}
