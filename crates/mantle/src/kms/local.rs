//! Offline provider: wraps the DEK under a locally held master key.
//!
//! Wrapped layout: `nonce (12) ‖ AES-256-GCM-SIV(dek) (32) ‖ tag (16)`, with the
//! key reference bound as associated data so a blob only unwraps under the
//! key reference it was wrapped for.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use mantle_common::{EnvelopeError, KeyRef};

use super::KmsProvider;
use crate::crypto::{cipher, random::OsRandom, KEY_LEN, NONCE_LEN, TAG_LEN};
use crate::dek::{generate_nonce, DekBytes};

/// Byte length of a wrapped 32-byte DEK.
pub const WRAPPED_LEN: usize = NONCE_LEN + KEY_LEN + TAG_LEN;

/// Master-key wrapping without an external service.
#[derive(Clone)]
pub struct LocalKms {
    master: std::sync::Arc<DekBytes>,
}

impl LocalKms {
    /// Use `key` as the master key.
    pub fn from_key(key: [u8; KEY_LEN]) -> Self {
        Self {
            master: std::sync::Arc::new(DekBytes::from_array(key)),
        }
    }

    /// Parse a base64-encoded 32-byte master key.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::DecodeFailure`] for invalid base64 and
    /// [`EnvelopeError::InvalidKeyLength`] if the decoded key is not 32 bytes.
    pub fn from_base64(encoded: &str) -> Result<Self, EnvelopeError> {
        let raw = STANDARD
            .decode(encoded.trim())
            .map_err(|e| EnvelopeError::DecodeFailure(format!("master key: {e}")))?;
        let master = DekBytes::from_unwrapped(raw)?;
        Ok(Self {
            master: std::sync::Arc::new(master),
        })
    }
}

impl std::fmt::Debug for LocalKms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LocalKms { master: [REDACTED] }")
    }
}

impl KmsProvider for LocalKms {
    fn name(&self) -> &'static str {
        "local"
    }

    fn default_wrapped_len(&self) -> usize {
        WRAPPED_LEN
    }

    async fn wrap(&self, dek: &[u8], key_ref: &KeyRef) -> Result<Vec<u8>, EnvelopeError> {
        let nonce = generate_nonce(&OsRandom)?;
        let sealed =
            cipher::seal_with_aad(self.master.as_bytes(), &nonce, dek, key_ref.as_str().as_bytes())?;
        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    async fn unwrap(&self, wrapped: &[u8], key_ref: &KeyRef) -> Result<Vec<u8>, EnvelopeError> {
        if wrapped.len() < NONCE_LEN + TAG_LEN {
            return Err(EnvelopeError::AuthenticationFailure(format!(
                "wrapped key too short: {} bytes",
                wrapped.len()
            )));
        }
        let (nonce, sealed) = wrapped.split_at(NONCE_LEN);
        cipher::open_with_aad(self.master.as_bytes(), nonce, sealed, key_ref.as_str().as_bytes())
    }
}
