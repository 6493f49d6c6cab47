//! AES-256-GCM-SIV sealing and opening of the envelope payload.
//!
//! The 16-byte authentication tag is appended to the ciphertext, so
//! `ciphertext.len() == plaintext.len() + TAG_LEN`. Any modification of the
//! ciphertext, key, nonce, or associated data makes [`open`] fail.

use aes_gcm_siv::{
    aead::{Aead, KeyInit, Payload},
    Aes256GcmSiv, Nonce,
};
use mantle_common::EnvelopeError;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of an AES-GCM-SIV nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the appended authentication tag.
pub const TAG_LEN: usize = 16;

/// Encrypt and authenticate `plaintext` under `key` and `nonce`.
///
/// # Errors
///
/// Returns [`EnvelopeError::InvalidKeyLength`] or [`EnvelopeError::InvalidNonceLength`]
/// if either input has the wrong size.
pub fn seal(key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    seal_with_aad(key, nonce, plaintext, &[])
}

/// Verify and decrypt `ciphertext` under `key` and `nonce`.
///
/// # Errors
///
/// Returns [`EnvelopeError::AuthenticationFailure`] if the tag does not verify
/// (tampered data, wrong key, or wrong nonce).
pub fn open(key: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    open_with_aad(key, nonce, ciphertext, &[])
}

/// [`seal`] with associated data bound into the tag.
pub fn seal_with_aad(
    key: &[u8],
    nonce: &[u8],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, EnvelopeError> {
    let cipher = build_cipher(key)?;
    let nonce = check_nonce(nonce)?;
    cipher
        .encrypt(nonce, Payload { msg: plaintext, aad })
        // Only reachable on plaintexts beyond the AEAD's length limit.
        .map_err(|_| EnvelopeError::AuthenticationFailure("aead seal failed".into()))
}

/// [`open`] with associated data that must match what was sealed.
pub fn open_with_aad(
    key: &[u8],
    nonce: &[u8],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, EnvelopeError> {
    let cipher = build_cipher(key)?;
    let nonce = check_nonce(nonce)?;
    cipher
        .decrypt(nonce, Payload { msg: ciphertext, aad })
        .map_err(|_| EnvelopeError::AuthenticationFailure("integrity tag did not verify".into()))
}

fn build_cipher(key: &[u8]) -> Result<Aes256GcmSiv, EnvelopeError> {
    let invalid = || EnvelopeError::InvalidKeyLength {
        expected: KEY_LEN,
        actual: key.len(),
    };
    if key.len() != KEY_LEN {
        return Err(invalid());
    }
    Aes256GcmSiv::new_from_slice(key).map_err(|_| invalid())
}

fn check_nonce(nonce: &[u8]) -> Result<&Nonce, EnvelopeError> {
    if nonce.len() != NONCE_LEN {
        return Err(EnvelopeError::InvalidNonceLength {
            expected: NONCE_LEN,
            actual: nonce.len(),
        });
    }
    Ok(Nonce::from_slice(nonce))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::random::{random_bytes, OsRandom};

    fn random_key() -> Vec<u8> {
        random_bytes(&OsRandom, KEY_LEN).unwrap()
    }

    fn random_nonce() -> Vec<u8> {
        random_bytes(&OsRandom, NONCE_LEN).unwrap()
    }

    #[test]
    fn seal_open_round_trip() {
        let key = random_key();
        let nonce = random_nonce();
        let sealed = seal(&key, &nonce, b"hello world").unwrap();
        assert_eq!(sealed.len(), b"hello world".len() + TAG_LEN);
        assert_eq!(open(&key, &nonce, &sealed).unwrap(), b"hello world");
    }

    #[test]
    fn empty_plaintext_is_tag_only() {
        let key = random_key();
        let nonce = random_nonce();
        let sealed = seal(&key, &nonce, b"").unwrap();
        assert_eq!(sealed.len(), TAG_LEN);
        assert!(open(&key, &nonce, &sealed).unwrap().is_empty());
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let nonce = random_nonce();
        let sealed = seal(&random_key(), &nonce, b"secret").unwrap();
        let err = open(&random_key(), &nonce, &sealed).unwrap_err();
        assert!(matches!(err, EnvelopeError::AuthenticationFailure(_)));
    }

    #[test]
    fn wrong_nonce_fails_authentication() {
        let key = random_key();
        let sealed = seal(&key, &random_nonce(), b"secret").unwrap();
        let err = open(&key, &random_nonce(), &sealed).unwrap_err();
        assert!(matches!(err, EnvelopeError::AuthenticationFailure(_)));
    }

    #[test]
    fn every_flipped_bit_is_detected() {
        let key = random_key();
        let nonce = random_nonce();
        let sealed = seal(&key, &nonce, b"tamper me").unwrap();
        for i in 0..sealed.len() * 8 {
            let mut tampered = sealed.clone();
            tampered[i / 8] ^= 1 << (i % 8);
            let err = open(&key, &nonce, &tampered).unwrap_err();
            assert!(matches!(err, EnvelopeError::AuthenticationFailure(_)));
        }
    }

    #[test]
    fn mismatched_aad_fails_authentication() {
        let key = random_key();
        let nonce = random_nonce();
        let sealed = seal_with_aad(&key, &nonce, b"dek", b"alias/a").unwrap();
        assert!(open_with_aad(&key, &nonce, &sealed, b"alias/a").is_ok());
        assert!(open_with_aad(&key, &nonce, &sealed, b"alias/b").is_err());
    }

    #[test]
    fn invalid_key_length_rejected() {
        let err = seal(&[0u8; 16], &random_nonce(), b"x").unwrap_err();
        assert!(matches!(
            err,
            EnvelopeError::InvalidKeyLength { expected: KEY_LEN, actual: 16 }
        ));
    }

    #[test]
    fn invalid_nonce_length_rejected() {
        let err = open(&random_key(), &[0u8; 8], &[0u8; 32]).unwrap_err();
        assert!(matches!(
            err,
            EnvelopeError::InvalidNonceLength { expected: NONCE_LEN, actual: 8 }
        ));
    }
}
