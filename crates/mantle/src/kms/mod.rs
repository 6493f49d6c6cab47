//! KMS providers that wrap and unwrap the per-envelope DEK.
//!
//! Every backend implements [`KmsProvider`]; the envelope codec is generic over
//! it and never names a concrete backend. [`Kms`] selects one at runtime from
//! configuration.
//!
//! Providers report failures to the caller and never retry internally. The
//! codec bounds each call with the configured deadline.

pub mod aws;
pub mod local;

use std::future::Future;

use anyhow::{Context, Result};
use mantle_common::{EnvelopeError, KeyRef, KmsBackendKind};

pub use aws::AwsKms;
pub use local::LocalKms;

use crate::config::Config;

/// A key-management backend able to wrap and unwrap a DEK under a named key.
///
/// Implementations must be safe for concurrent use: the returned futures are
/// `Send` and take `&self`, so one provider can serve many simultaneous calls.
pub trait KmsProvider: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Length of a wrapped 32-byte DEK for this backend.
    fn default_wrapped_len(&self) -> usize;

    /// Encrypt `dek` under the key named by `key_ref`.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::KmsUnavailable`] on transport, auth, or permission failures.
    fn wrap(
        &self,
        dek: &[u8],
        key_ref: &KeyRef,
    ) -> impl Future<Output = Result<Vec<u8>, EnvelopeError>> + Send;

    /// Decrypt a blob previously produced by [`KmsProvider::wrap`].
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::AuthenticationFailure`] if the backend rejects the blob
    /// as tampered or foreign, and [`EnvelopeError::KmsUnavailable`] otherwise.
    fn unwrap(
        &self,
        wrapped: &[u8],
        key_ref: &KeyRef,
    ) -> impl Future<Output = Result<Vec<u8>, EnvelopeError>> + Send;

    /// Single bidirectional entry point: wraps when `encrypt` is `true`, unwraps otherwise.
    fn crypto(
        &self,
        blob: &[u8],
        key_ref: &KeyRef,
        encrypt: bool,
    ) -> impl Future<Output = Result<Vec<u8>, EnvelopeError>> + Send {
        async move {
            if encrypt {
                self.wrap(blob, key_ref).await
            } else {
                self.unwrap(blob, key_ref).await
            }
        }
    }
}

/// The configured backend.
#[derive(Debug, Clone)]
pub enum Kms {
    Aws(AwsKms),
    Local(LocalKms),
}

impl Kms {
    /// Build the backend named by `cfg.kms_provider`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend's own settings are missing or invalid.
    pub async fn from_config(cfg: &Config) -> Result<Self> {
        match cfg.kms_provider {
            KmsBackendKind::Aws => {
                let kms = AwsKms::init(
                    cfg.aws_region.clone(),
                    cfg.aws_endpoint_url.clone(),
                    cfg.aws_profile.clone(),
                )
                .await;
                Ok(Kms::Aws(kms))
            }
            KmsBackendKind::Local => {
                let key = cfg
                    .local_master_key
                    .as_deref()
                    .context("MANTLE_LOCAL_MASTER_KEY is required for the local kms provider")?;
                let kms = LocalKms::from_base64(key).context("invalid local master key")?;
                Ok(Kms::Local(kms))
            }
        }
    }
}

impl KmsProvider for Kms {
    fn name(&self) -> &'static str {
        match self {
            Kms::Aws(k) => k.name(),
            Kms::Local(k) => k.name(),
        }
    }

    fn default_wrapped_len(&self) -> usize {
        match self {
            Kms::Aws(k) => k.default_wrapped_len(),
            Kms::Local(k) => k.default_wrapped_len(),
        }
    }

    async fn wrap(&self, dek: &[u8], key_ref: &KeyRef) -> Result<Vec<u8>, EnvelopeError> {
        match self {
            Kms::Aws(k) => k.wrap(dek, key_ref).await,
            Kms::Local(k) => k.wrap(dek, key_ref).await,
        }
    }

    async fn unwrap(&self, wrapped: &[u8], key_ref: &KeyRef) -> Result<Vec<u8>, EnvelopeError> {
        match self {
            Kms::Aws(k) => k.unwrap(wrapped, key_ref).await,
            Kms::Local(k) => k.unwrap(wrapped, key_ref).await,
        }
    }
}
