//! Error type shared by every layer of the envelope pipeline.

use thiserror::Error;

/// Errors produced while sealing or opening an envelope.
///
/// Variants are grouped by who is at fault:
/// - [`EnvelopeError::RandomSourceUnavailable`] and [`EnvelopeError::KmsUnavailable`] → environment
/// - [`EnvelopeError::AuthenticationFailure`] → tampered data, wrong key, or wrong key reference
/// - [`EnvelopeError::MalformedEnvelope`] and [`EnvelopeError::DecodeFailure`] → transport corruption
/// - [`EnvelopeError::InvalidKeyLength`], [`EnvelopeError::InvalidNonceLength`] and
///   [`EnvelopeError::WrappedDekLength`] → configuration or programmer error
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The operating system entropy source could not supply random bytes.
    #[error("random source unavailable: {0}")]
    RandomSourceUnavailable(String),

    /// The external key service could not be reached or refused the request.
    #[error("kms unavailable: {0}")]
    KmsUnavailable(String),

    /// An integrity tag did not verify, or a self-check found a mismatch.
    #[error("authentication failure: {0}")]
    AuthenticationFailure(String),

    /// The decoded bytes are too short to hold a nonce and a wrapped DEK.
    #[error("malformed envelope: {len} bytes, need at least {min}")]
    MalformedEnvelope { len: usize, min: usize },

    /// The envelope text is not valid base64.
    #[error("decode failure: {0}")]
    DecodeFailure(String),

    /// A key of the wrong length was handed to the cipher.
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// A nonce of the wrong length was handed to the cipher.
    #[error("invalid nonce length: expected {expected} bytes, got {actual}")]
    InvalidNonceLength { expected: usize, actual: usize },

    /// The KMS returned a wrapped DEK whose length differs from the configured one.
    #[error("wrapped DEK length mismatch: configured {expected} bytes, kms returned {actual}")]
    WrappedDekLength { expected: usize, actual: usize },
}

impl EnvelopeError {
    /// Short, stable, machine-readable code for logs and exit reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            EnvelopeError::RandomSourceUnavailable(_) => "random_source_unavailable",
            EnvelopeError::KmsUnavailable(_) => "kms_unavailable",
            EnvelopeError::AuthenticationFailure(_) => "authentication_failure",
            EnvelopeError::MalformedEnvelope { .. } => "malformed_envelope",
            EnvelopeError::DecodeFailure(_) => "decode_failure",
            EnvelopeError::InvalidKeyLength { .. } => "invalid_key_length",
            EnvelopeError::InvalidNonceLength { .. } => "invalid_nonce_length",
            EnvelopeError::WrappedDekLength { .. } => "wrapped_dek_length",
        }
    }

    /// Returns `true` for failures of the environment (KMS, entropy) rather
    /// than of the envelope or the caller. These are worth retrying.
    pub fn is_environmental(&self) -> bool {
        matches!(
            self,
            EnvelopeError::KmsUnavailable(_) | EnvelopeError::RandomSourceUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinct() {
        let errors = [
            EnvelopeError::RandomSourceUnavailable("x".into()),
            EnvelopeError::KmsUnavailable("x".into()),
            EnvelopeError::AuthenticationFailure("x".into()),
            EnvelopeError::MalformedEnvelope { len: 1, min: 2 },
            EnvelopeError::DecodeFailure("x".into()),
            EnvelopeError::InvalidKeyLength { expected: 32, actual: 16 },
            EnvelopeError::InvalidNonceLength { expected: 12, actual: 8 },
            EnvelopeError::WrappedDekLength { expected: 60, actual: 61 },
        ];
        let mut kinds: Vec<_> = errors.iter().map(EnvelopeError::kind).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn environment_errors_are_separated_from_data_errors() {
        assert!(EnvelopeError::KmsUnavailable("down".into()).is_environmental());
        assert!(EnvelopeError::RandomSourceUnavailable("none".into()).is_environmental());
        assert!(!EnvelopeError::DecodeFailure("bad".into()).is_environmental());
        assert!(!EnvelopeError::MalformedEnvelope { len: 0, min: 72 }.is_environmental());
        assert!(!EnvelopeError::InvalidKeyLength { expected: 32, actual: 31 }.is_environmental());
    }

    #[test]
    fn display_includes_lengths() {
        let e = EnvelopeError::MalformedEnvelope { len: 10, min: 72 };
        let s = e.to_string();
        assert!(s.contains("10"));
        assert!(s.contains("72"));
    }
}
