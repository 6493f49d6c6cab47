//! Envelope codec: seal a plaintext into a self-contained text envelope and back.
//!
//! # Seal
//!
//! 1. Draw a fresh DEK and nonce from the [`RandomSource`].
//! 2. Encrypt the plaintext under (DEK, nonce) with AES-256-GCM-SIV.
//! 3. Wrap the DEK through the [`KmsProvider`] and check the wrapped length.
//! 4. Lay out `ciphertext ‖ nonce ‖ wrapped DEK` and base64-encode it.
//! 5. Unless disabled, open the result again and compare with the input.
//!
//! # Open
//!
//! Decode, split from the tail, unwrap the DEK, decrypt.
//!
//! The codec holds no mutable state; one instance may serve concurrent callers.

pub mod layout;
pub mod validate;

use std::time::Duration;

use mantle_common::{EnvelopeError, KeyRef};
use tokio::time;
use tracing::{debug, instrument, warn};

use crate::crypto::{cipher, random::OsRandom, RandomSource};
use crate::dek::{generate_nonce, DekBytes};
use crate::kms::KmsProvider;

pub use layout::DEFAULT_LINE_WIDTH;

/// Default deadline for one KMS round-trip.
pub const DEFAULT_KMS_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-codec settings. Built explicitly by the caller, never read from globals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecOptions {
    /// Exact byte length of a wrapped DEK for the configured backend.
    pub wrapped_dek_len: usize,
    /// Column at which to wrap the encoded text; `None` for a single line.
    pub line_width: Option<usize>,
    /// Open every freshly sealed envelope and compare it with the input.
    pub validate: bool,
    /// Upper bound on each KMS call.
    pub kms_timeout: Duration,
}

impl CodecOptions {
    /// Options with the given wrapped length and defaults for everything else.
    pub fn new(wrapped_dek_len: usize) -> Self {
        Self {
            wrapped_dek_len,
            line_width: Some(DEFAULT_LINE_WIDTH),
            validate: true,
            kms_timeout: DEFAULT_KMS_TIMEOUT,
        }
    }

    /// Options using the provider's own wrapped length.
    pub fn for_provider<P: KmsProvider>(kms: &P) -> Self {
        Self::new(kms.default_wrapped_len())
    }

    pub fn single_line(mut self, single_line: bool) -> Self {
        self.line_width = if single_line { None } else { Some(DEFAULT_LINE_WIDTH) };
        self
    }

    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn kms_timeout(mut self, timeout: Duration) -> Self {
        self.kms_timeout = timeout;
        self
    }
}

/// Seals and opens envelopes against one KMS key.
#[derive(Debug)]
pub struct EnvelopeCodec<P, R = OsRandom> {
    kms: P,
    random: R,
    key_ref: KeyRef,
    options: CodecOptions,
}

impl<P: KmsProvider> EnvelopeCodec<P> {
    /// Create a codec drawing randomness from the OS CSPRNG.
    pub fn new(kms: P, key_ref: KeyRef, options: CodecOptions) -> Self {
        Self::with_random_source(kms, OsRandom, key_ref, options)
    }
}

impl<P: KmsProvider, R: RandomSource> EnvelopeCodec<P, R> {
    /// Create a codec with an explicit random source.
    pub fn with_random_source(kms: P, random: R, key_ref: KeyRef, options: CodecOptions) -> Self {
        Self {
            kms,
            random,
            key_ref,
            options,
        }
    }

    /// Encrypt `plaintext` into base64 envelope text.
    ///
    /// # Errors
    ///
    /// - [`EnvelopeError::RandomSourceUnavailable`] if no DEK or nonce could be drawn.
    /// - [`EnvelopeError::KmsUnavailable`] if the wrap call fails or times out.
    /// - [`EnvelopeError::WrappedDekLength`] if the KMS output has an unexpected length.
    /// - [`EnvelopeError::AuthenticationFailure`] if self-validation does not reproduce the input.
    #[instrument(skip_all, fields(kms = self.kms.name(), plaintext_len = plaintext.len()))]
    pub async fn seal(&self, plaintext: &[u8]) -> Result<String, EnvelopeError> {
        let dek = DekBytes::generate(&self.random)?;
        let nonce = generate_nonce(&self.random)?;
        let ciphertext = cipher::seal(dek.as_bytes(), &nonce, plaintext)?;

        let wrapped = self.kms_call(dek.as_bytes(), true).await?;
        drop(dek);
        if wrapped.len() != self.options.wrapped_dek_len {
            return Err(EnvelopeError::WrappedDekLength {
                expected: self.options.wrapped_dek_len,
                actual: wrapped.len(),
            });
        }

        let bytes = layout::assemble(&ciphertext, &nonce, &wrapped);
        let text = layout::encode_text(&bytes, self.options.line_width);
        debug!(envelope_len = bytes.len(), "envelope assembled");

        if self.options.validate {
            validate::verify_round_trip(self, &text, plaintext).await?;
        } else {
            warn!("self-validation disabled; envelope not verified");
        }
        Ok(text)
    }

    /// Decrypt base64 envelope text. Whitespace in `text` is ignored.
    ///
    /// # Errors
    ///
    /// - [`EnvelopeError::DecodeFailure`] if `text` is not valid base64.
    /// - [`EnvelopeError::MalformedEnvelope`] if the decoded bytes are too short.
    /// - [`EnvelopeError::KmsUnavailable`] if the unwrap call fails or times out.
    /// - [`EnvelopeError::AuthenticationFailure`] if the DEK or payload fails to verify.
    pub async fn open(&self, text: &str) -> Result<Vec<u8>, EnvelopeError> {
        let bytes = layout::decode_text(text)?;
        self.open_bytes(&bytes).await
    }

    /// Decrypt already-decoded envelope bytes.
    #[instrument(skip_all, fields(kms = self.kms.name(), envelope_len = bytes.len()))]
    pub async fn open_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
        let segments = layout::split(bytes, self.options.wrapped_dek_len)?;
        let raw_dek = self.kms_call(segments.wrapped_dek, false).await?;
        let dek = DekBytes::from_unwrapped(raw_dek)?;
        let plaintext = cipher::open(dek.as_bytes(), segments.nonce, segments.ciphertext)?;
        debug!(plaintext_len = plaintext.len(), "envelope opened");
        Ok(plaintext)
    }

    async fn kms_call(&self, blob: &[u8], encrypt: bool) -> Result<Vec<u8>, EnvelopeError> {
        let deadline = self.options.kms_timeout;
        match time::timeout(deadline, self.kms.crypto(blob, &self.key_ref, encrypt)).await {
            Ok(result) => result,
            Err(_) => Err(EnvelopeError::KmsUnavailable(format!(
                "kms {} timed out after {deadline:?}",
                if encrypt { "wrap" } else { "unwrap" }
            ))),
        }
    }
}
