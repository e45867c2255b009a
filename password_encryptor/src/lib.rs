//! Password-based encryption for configuration secrets. Values are sealed
//! with ChaCha20-Poly1305 under a key derived from a passphrase via Argon2id
//! and printed as one base64 token, so a config file never holds a plaintext
//! credential. Encrypted values are wrapped as `ENC(token)` to sit next to
//! plaintext ones.

use argon2::{Config as Argon2Config, Variant};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LEN: u32 = 32;

const ENC_PREFIX: &str = "ENC(";
const ENC_SUFFIX: &str = ")";

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key derivation failed: {0}")]
    Derivation(String),
    #[error("encryption failed")]
    Encryption,
    #[error("decryption failed; wrong passphrase or corrupted token")]
    Decryption,
    #[error("malformed token: {0}")]
    Malformed(String),
}

fn derive_key(passphrase: &str, salt: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut config = Argon2Config::default();
    config.variant = Variant::Argon2id;
    config.hash_length = KEY_LEN;
    argon2::hash_raw(passphrase.as_bytes(), salt, &config)
        .map_err(|e| CryptoError::Derivation(e.to_string()))
}

/// Encrypts a secret under a passphrase. The token layout is
/// `base64(salt || nonce || ciphertext+tag)`; salt and nonce are random per
/// call, so encrypting the same value twice yields different tokens.
pub fn encrypt(plaintext: &str, passphrase: &str) -> Result<String, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut nonce);

    let key = derive_key(passphrase, &salt)?;
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|_| CryptoError::Encryption)?;

    let mut blob = Vec::with_capacity(SALT_LEN + NONCE_LEN + sealed.len());
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&sealed);
    Ok(base64::encode(&blob))
}

/// Reverses [`encrypt`]. A wrong passphrase or a tampered token fails the
/// authentication tag and reports `Decryption`.
pub fn decrypt(token: &str, passphrase: &str) -> Result<String, CryptoError> {
    let blob = base64::decode(token.trim()).map_err(|e| CryptoError::Malformed(e.to_string()))?;
    if blob.len() < SALT_LEN + NONCE_LEN + TAG_LEN {
        return Err(CryptoError::Malformed(String::from("token too short")));
    }
    let (salt, rest) = blob.split_at(SALT_LEN);
    let (nonce, sealed) = rest.split_at(NONCE_LEN);

    let key = derive_key(passphrase, salt)?;
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
    let plain = cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| CryptoError::Decryption)?;
    String::from_utf8(plain).map_err(|_| CryptoError::Malformed(String::from("not valid utf-8")))
}

pub fn wrap(token: &str) -> String {
    format!("{}{}{}", ENC_PREFIX, token, ENC_SUFFIX)
}

pub fn is_wrapped(value: &str) -> bool {
    unwrap_token(value).is_some()
}

pub fn unwrap_token(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.starts_with(ENC_PREFIX) && trimmed.ends_with(ENC_SUFFIX) {
        Some(&trimmed[ENC_PREFIX.len()..trimmed.len() - ENC_SUFFIX.len()])
    } else {
        None
    }
}

/// Resolves a configuration value: `ENC(...)` values are decrypted, anything
/// else passes through untouched.
pub fn decrypt_property(value: &str, passphrase: &str) -> Result<String, CryptoError> {
    match unwrap_token(value) {
        Some(token) => decrypt(token, passphrase),
        None => Ok(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_round_trip() {
        let token = encrypt("daminda@77", "wholesale_secret_key").unwrap();
        let plain = decrypt(&token, "wholesale_secret_key").unwrap();
        assert_eq!(plain, "daminda@77");
    }

    #[test]
    fn same_plaintext_gives_different_tokens() {
        let first = encrypt("secret", "key").unwrap();
        let second = encrypt("secret", "key").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn wrong_passphrase_is_rejected() {
        let token = encrypt("secret", "right-passphrase").unwrap();
        match decrypt(&token, "wrong-passphrase") {
            Err(CryptoError::Decryption) => {}
            other => panic!("expected Decryption error, got {:?}", other),
        }
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = encrypt("secret", "key").unwrap();
        let mut blob = base64::decode(&token).unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0xff;
        match decrypt(&base64::encode(&blob), "key") {
            Err(CryptoError::Decryption) => {}
            other => panic!("expected Decryption error, got {:?}", other),
        }
    }

    #[test]
    fn garbage_token_is_malformed() {
        assert!(matches!(
            decrypt("not base64!!!", "key"),
            Err(CryptoError::Malformed(_))
        ));
        assert!(matches!(
            decrypt(&base64::encode(b"short"), "key"),
            Err(CryptoError::Malformed(_))
        ));
    }

    #[test]
    fn enc_wrapping_round_trip() {
        let wrapped = wrap("abc123");
        assert!(is_wrapped(&wrapped));
        assert_eq!(unwrap_token(&wrapped), Some("abc123"));
        assert!(!is_wrapped("postgres://user:pw@localhost/records"));
    }

    #[test]
    fn decrypt_property_passes_plaintext_through() {
        let value = "postgres://user:pw@localhost/records";
        assert_eq!(decrypt_property(value, "key").unwrap(), value);
    }

    #[test]
    fn decrypt_property_resolves_wrapped_values() {
        let token = encrypt("postgres://user:pw@localhost/records", "key").unwrap();
        let resolved = decrypt_property(&wrap(&token), "key").unwrap();
        assert_eq!(resolved, "postgres://user:pw@localhost/records");
    }
}
