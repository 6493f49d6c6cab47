//! Post-seal self-check: the envelope just produced must open to the input.

use mantle_common::EnvelopeError;
use tracing::debug;
use zeroize::Zeroizing;

use super::EnvelopeCodec;
use crate::crypto::RandomSource;
use crate::kms::KmsProvider;

/// Open `envelope` with `codec` and compare the result with `plaintext` byte for byte.
///
/// Data-level failures while reopening, and any mismatch, become
/// [`EnvelopeError::AuthenticationFailure`]. Environment failures (KMS,
/// entropy) propagate unchanged.
pub async fn verify_round_trip<P, R>(
    codec: &EnvelopeCodec<P, R>,
    envelope: &str,
    plaintext: &[u8],
) -> Result<(), EnvelopeError>
where
    P: KmsProvider,
    R: RandomSource,
{
    let recovered = Zeroizing::new(codec.open(envelope).await.map_err(escalate)?);
    if recovered.as_slice() != plaintext {
        return Err(EnvelopeError::AuthenticationFailure(
            "self-validation: envelope does not decrypt to the original plaintext".into(),
        ));
    }
    debug!("self-validation passed");
    Ok(())
}

fn escalate(err: EnvelopeError) -> EnvelopeError {
    if err.is_environmental() {
        err
    } else {
        EnvelopeError::AuthenticationFailure(format!("self-validation: {err}"))
    }
}
