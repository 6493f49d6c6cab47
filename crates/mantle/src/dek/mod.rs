//! Per-envelope Data Encryption Key (DEK) and nonce generation.
//!
//! # Lifecycle
//!
//! 1. [`DekBytes::generate`] draws a fresh 32-byte key at the start of every seal.
//! 2. The key encrypts exactly one payload and is handed to the KMS once to be wrapped.
//! 3. On open, [`DekBytes::from_unwrapped`] takes ownership of the KMS output and
//!    wipes the source buffer.
//! 4. The key is wiped when the [`DekBytes`] is dropped.
//!
//! # Security invariants
//!
//! - The plaintext DEK is **never** written to the envelope, to disk, or to logs.
//! - A DEK/nonce pair is never reused; both are generated per call, not cached.

use mantle_common::EnvelopeError;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::{random::RandomSource, KEY_LEN, NONCE_LEN};

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// When this type is dropped, the memory is overwritten with zeroes to
/// minimise the window during which plaintext key material lives in RAM.
pub struct DekBytes(Box<[u8; KEY_LEN]>);

impl DekBytes {
    /// Generate a fresh random DEK.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::RandomSourceUnavailable`] if the source fails.
    pub fn generate<R: RandomSource + ?Sized>(source: &R) -> Result<Self, EnvelopeError> {
        let mut buf = Box::new([0u8; KEY_LEN]);
        source.fill(&mut buf[..])?;
        Ok(Self(buf))
    }

    /// Take ownership of a key held in a fixed-size array.
    pub fn from_array(key: [u8; KEY_LEN]) -> Self {
        Self(Box::new(key))
    }

    /// Copy key material from a slice.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::InvalidKeyLength`] if the slice is not [`KEY_LEN`] bytes.
    pub fn from_slice(key_bytes: &[u8]) -> Result<Self, EnvelopeError> {
        if key_bytes.len() != KEY_LEN {
            return Err(EnvelopeError::InvalidKeyLength {
                expected: KEY_LEN,
                actual: key_bytes.len(),
            });
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(key_bytes);
        Ok(Self(buf))
    }

    /// Take a DEK returned by a KMS unwrap. The returned buffer is wiped on every path.
    pub fn from_unwrapped(raw: Vec<u8>) -> Result<Self, EnvelopeError> {
        let raw = Zeroizing::new(raw);
        Self::from_slice(&raw)
    }

    /// Borrow the key bytes for one cipher operation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }
}

impl Zeroize for DekBytes {
    fn zeroize(&mut self) {
        (*self.0).zeroize();
    }
}

impl Drop for DekBytes {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for DekBytes {}

impl std::fmt::Debug for DekBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material, not even in debug builds.
        f.write_str("DekBytes([REDACTED])")
    }
}

/// Generate a fresh random nonce. Nonces are not secret and travel in the envelope.
pub fn generate_nonce<R: RandomSource + ?Sized>(source: &R) -> Result<[u8; NONCE_LEN], EnvelopeError> {
    let mut nonce = [0u8; NONCE_LEN];
    source.fill(&mut nonce)?;
    Ok(nonce)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::random::{MockRandomSource, OsRandom};

    #[test]
    fn generated_deks_differ() {
        let a = DekBytes::generate(&OsRandom).unwrap();
        let b = DekBytes::generate(&OsRandom).unwrap();
        assert_eq!(a.as_bytes().len(), KEY_LEN);
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn generate_uses_the_given_source() {
        let mut source = MockRandomSource::new();
        source.expect_fill().times(1).returning(|buf| {
            buf.fill(0x42);
            Ok(())
        });
        let dek = DekBytes::generate(&source).unwrap();
        assert_eq!(dek.as_bytes(), &[0x42u8; KEY_LEN][..]);
    }

    #[test]
    fn generate_propagates_source_failure() {
        let mut source = MockRandomSource::new();
        source
            .expect_fill()
            .returning(|_| Err(EnvelopeError::RandomSourceUnavailable("getrandom failed".into())));
        assert!(matches!(
            DekBytes::generate(&source),
            Err(EnvelopeError::RandomSourceUnavailable(_))
        ));
        assert!(matches!(
            generate_nonce(&source),
            Err(EnvelopeError::RandomSourceUnavailable(_))
        ));
    }

    #[test]
    fn rejects_wrong_length() {
        let err = DekBytes::from_slice(&[0u8; 16]).unwrap_err();
        assert!(matches!(
            err,
            EnvelopeError::InvalidKeyLength { expected: KEY_LEN, actual: 16 }
        ));
    }

    #[test]
    fn from_unwrapped_keeps_key() {
        let dek = DekBytes::from_unwrapped(vec![0x07u8; KEY_LEN]).unwrap();
        assert_eq!(dek.as_bytes(), &[0x07u8; KEY_LEN][..]);
    }

    #[test]
    fn zeroize_clears_key_material() {
        let mut dek = DekBytes::from_array([0xA5u8; KEY_LEN]);
        dek.zeroize();
        assert_eq!(dek.as_bytes(), &[0u8; KEY_LEN][..]);
    }

    #[test]
    fn dek_bytes_wipes_on_drop() {
        fn assert_zeroize_on_drop<T: ZeroizeOnDrop>() {}
        assert_zeroize_on_drop::<DekBytes>();
    }

    #[test]
    fn from_unwrapped_rejects_short_key() {
        assert!(matches!(
            DekBytes::from_unwrapped(vec![0x07u8; KEY_LEN - 1]),
            Err(EnvelopeError::InvalidKeyLength { expected: KEY_LEN, actual: 31 })
        ));
    }

    #[test]
    fn nonces_have_fixed_length_and_differ() {
        let a = generate_nonce(&OsRandom).unwrap();
        let b = generate_nonce(&OsRandom).unwrap();
        assert_eq!(a.len(), NONCE_LEN);
        assert_ne!(a, b);
    }

    #[test]
    fn dek_bytes_redacted_in_debug() {
        let dek = DekBytes::from_slice(&[0xFFu8; KEY_LEN]).unwrap();
        assert!(format!("{dek:?}").contains("REDACTED"));
    }
}
