//! # AES-256-GCM Sealing
//!
//! Authenticated encryption for plaintexts held by the confidential-value
//! coprocessor. Every stored value is sealed under the coprocessor key with
//! its ciphertext handle as additional authenticated data, so a sealed blob
//! copied under a different handle fails to open.
//!
//! ## Nonce management
//!
//! Random 96-bit nonces from the OS CSPRNG. The birthday bound is ~2^48
//! messages per key, far beyond the lifetime of one coprocessor.
//!
//! ## Wire format
//!
//! [`seal`] returns `nonce || ciphertext`; [`open`] expects the same.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use thiserror::Error;

use crate::config::{AES_KEY_LENGTH, AES_NONCE_LENGTH};

/// Errors that can occur during sealing/opening.
///
/// Kept vague on purpose: the difference between "wrong key" and
/// "corrupted ciphertext" is nobody's business.
#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("encryption failed")]
    EncryptFailed,

    #[error("decryption failed -- wrong key, wrong aad or corrupted ciphertext")]
    DecryptFailed,

    #[error("ciphertext too short: must be at least {AES_NONCE_LENGTH} bytes")]
    CiphertextTooShort,
}

/// Generate a fresh random AES-256 key from the OS CSPRNG.
pub fn generate_key() -> [u8; AES_KEY_LENGTH] {
    let mut key = [0u8; AES_KEY_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut key);
    key
}

/// Seal `plaintext` with AES-256-GCM, authenticating `aad` alongside it.
///
/// Returns `nonce || ciphertext` (ciphertext includes the 16-byte tag).
///
/// # Example
///
/// ```
/// use shroud_protocol::crypto::encryption::{generate_key, open, seal};
///
/// let key = generate_key();
/// let sealed = seal(&key, b"42", b"handle").unwrap();
/// assert_eq!(open(&key, &sealed, b"handle").unwrap(), b"42");
/// assert!(open(&key, &sealed, b"other handle").is_err());
/// ```
pub fn seal(
    key: &[u8; AES_KEY_LENGTH],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, EncryptionError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EncryptionError::EncryptFailed)?;

    let mut nonce_bytes = [0u8; AES_NONCE_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| EncryptionError::EncryptFailed)?;

    let mut out = Vec::with_capacity(AES_NONCE_LENGTH + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Open data previously produced by [`seal`] with the same key and `aad`.
pub fn open(
    key: &[u8; AES_KEY_LENGTH],
    sealed: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, EncryptionError> {
    if sealed.len() < AES_NONCE_LENGTH {
        return Err(EncryptionError::CiphertextTooShort);
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(AES_NONCE_LENGTH);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EncryptionError::DecryptFailed)?;
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| EncryptionError::DecryptFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_roundtrip() {
        let key = generate_key();
        let sealed = seal(&key, &42u64.to_le_bytes(), b"aad").unwrap();
        let opened = open(&key, &sealed, b"aad").unwrap();
        assert_eq!(opened, 42u64.to_le_bytes());
    }

    #[test]
    fn wrong_key_fails() {
        let sealed = seal(&generate_key(), b"secret", b"").unwrap();
        assert!(open(&generate_key(), &sealed, b"").is_err());
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let key = generate_key();
        let mut sealed = seal(&key, b"secret", b"").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(open(&key, &sealed, b"").is_err());
    }

    #[test]
    fn truncated_input_rejected() {
        let key = generate_key();
        assert!(matches!(
            open(&key, &[0u8; 5], b""),
            Err(EncryptionError::CiphertextTooShort)
        ));
    }

    #[test]
    fn same_plaintext_seals_differently() {
        let key = generate_key();
        let a = seal(&key, b"same", b"").unwrap();
        let b = seal(&key, b"same", b"").unwrap();
        assert_ne!(a, b);
    }
}
