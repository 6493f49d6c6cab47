//! AWS KMS provider: `Encrypt` to wrap the DEK, `Decrypt` to unwrap it.

use aws_config::{BehaviorVersion, Region};
use aws_sdk_kms::error::{DisplayErrorContext, SdkError};
use aws_sdk_kms::operation::decrypt::DecryptError;
use aws_sdk_kms::primitives::Blob;
use mantle_common::{EnvelopeError, KeyRef};
use tracing::debug;

use super::KmsProvider;

/// Ciphertext blob length AWS KMS returns for a 32-byte plaintext under a
/// symmetric key.
pub const DEFAULT_WRAPPED_LEN: usize = 184;

/// KMS client wrapper. The SDK client is internally reference counted and
/// safe to share across concurrent calls.
#[derive(Debug, Clone)]
pub struct AwsKms {
    client: aws_sdk_kms::Client,
}

impl AwsKms {
    /// Initialise the KMS client from the standard AWS credential chain.
    ///
    /// `region`, `endpoint_url` and `profile` override what the environment
    /// and shared config files would otherwise select.
    pub async fn init(
        region: Option<String>,
        endpoint_url: Option<String>,
        profile: Option<String>,
    ) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_kms::config::Builder::from(&sdk_config);
        if let Some(url) = endpoint_url {
            builder = builder.endpoint_url(url);
        }
        Self::from_client(aws_sdk_kms::Client::from_conf(builder.build()))
    }

    /// Wrap an already configured SDK client.
    pub fn from_client(client: aws_sdk_kms::Client) -> Self {
        Self { client }
    }
}

impl KmsProvider for AwsKms {
    fn name(&self) -> &'static str {
        "aws"
    }

    fn default_wrapped_len(&self) -> usize {
        DEFAULT_WRAPPED_LEN
    }

    async fn wrap(&self, dek: &[u8], key_ref: &KeyRef) -> Result<Vec<u8>, EnvelopeError> {
        // The SDK owns its request copy of the key; it is serialised into the
        // TLS request body and dropped with the request.
        let resp = self
            .client
            .encrypt()
            .key_id(key_ref.as_str())
            .plaintext(Blob::new(dek.to_vec()))
            .send()
            .await
            .map_err(|e| {
                EnvelopeError::KmsUnavailable(format!(
                    "kms encrypt failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let blob = resp.ciphertext_blob().ok_or_else(|| {
            EnvelopeError::KmsUnavailable("kms encrypt response contained no ciphertext".into())
        })?;
        debug!(key_id = resp.key_id().unwrap_or_default(), len = blob.as_ref().len(), "DEK wrapped");
        Ok(blob.as_ref().to_vec())
    }

    async fn unwrap(&self, wrapped: &[u8], key_ref: &KeyRef) -> Result<Vec<u8>, EnvelopeError> {
        let resp = self
            .client
            .decrypt()
            .key_id(key_ref.as_str())
            .ciphertext_blob(Blob::new(wrapped.to_vec()))
            .send()
            .await
            .map_err(|e| classify_decrypt_error(&e))?;

        // Move the key out of the response instead of copying it.
        let plaintext = resp.plaintext.ok_or_else(|| {
            EnvelopeError::KmsUnavailable("kms decrypt response contained no plaintext".into())
        })?;
        Ok(plaintext.into_inner())
    }
}

/// Rejections of the blob itself are tampering; everything else is the service.
fn classify_decrypt_error<R>(err: &SdkError<DecryptError, R>) -> EnvelopeError
where
    R: std::fmt::Debug,
{
    let detail = DisplayErrorContext(err);
    match err.as_service_error() {
        Some(e) if e.is_invalid_ciphertext_exception() || e.is_incorrect_key_exception() => {
            EnvelopeError::AuthenticationFailure(format!("kms rejected wrapped DEK: {detail}"))
        }
        _ => EnvelopeError::KmsUnavailable(format!("kms decrypt failed: {detail}")),
    }
}
