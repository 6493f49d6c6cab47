//! Cryptographically secure random bytes for DEKs and nonces.

use aes_gcm_siv::aead::{rand_core::RngCore, OsRng};
use mantle_common::EnvelopeError;

/// Supplies random bytes drawn from a cryptographically secure generator.
///
/// Implementations must be usable from many tasks at once; they hold no
/// per-call state.
#[cfg_attr(test, mockall::automock)]
pub trait RandomSource: Send + Sync {
    /// Fill `buf` entirely with random bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::RandomSourceUnavailable`] if the entropy source fails.
    fn fill(&self, buf: &mut [u8]) -> Result<(), EnvelopeError>;
}

/// The operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), EnvelopeError> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| EnvelopeError::RandomSourceUnavailable(e.to_string()))
    }
}

/// Return `n` fresh random bytes from `source`.
pub fn random_bytes<R: RandomSource + ?Sized>(source: &R, n: usize) -> Result<Vec<u8>, EnvelopeError> {
    let mut buf = vec![0u8; n];
    source.fill(&mut buf)?;
    Ok(buf)
}
