//! Configuration loading and validation.
//!
//! Values are read from `MANTLE_*` environment variables; command-line flags
//! are layered on top as overrides. The process exits with a clear error
//! message if a required value is missing or invalid.

use std::time::Duration;

use anyhow::{Context, Result};
use mantle_common::{KeyRef, KmsBackendKind};
use serde::Deserialize;

use crate::envelope::CodecOptions;

/// Environment variable prefix, e.g. `MANTLE_KEY_ID`.
pub const ENV_PREFIX: &str = "MANTLE";

/// Validated configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Which KMS backend wraps the DEK.
    #[serde(default = "default_kms_provider")]
    pub kms_provider: KmsBackendKind,

    /// Key id, ARN, or alias of the wrapping key. **Required.**
    #[serde(default)]
    pub key_id: String,

    /// AWS region override.
    pub aws_region: Option<String>,

    /// AWS KMS endpoint override (e.g. a local KMS emulator).
    pub aws_endpoint_url: Option<String>,

    /// Named AWS profile from the shared config files.
    pub aws_profile: Option<String>,

    /// Base64 32-byte master key. **Required** for the `local` provider.
    pub local_master_key: Option<String>,

    /// Byte length of a wrapped DEK; defaults to the provider's own value.
    pub wrapped_dek_len: Option<usize>,

    /// Deadline (seconds) for each KMS round-trip.
    #[serde(default = "default_kms_timeout")]
    pub kms_timeout_secs: u64,

    /// Tracing log level (e.g. `"warn"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines instead of compact text.
    #[serde(default)]
    pub log_json: bool,
}

/// Values supplied on the command line. `None` leaves the environment value in place.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub kms_provider: Option<String>,
    pub key_id: Option<String>,
    pub aws_region: Option<String>,
    pub aws_endpoint_url: Option<String>,
    pub aws_profile: Option<String>,
    pub wrapped_dek_len: Option<usize>,
    pub kms_timeout_secs: Option<u64>,
    pub log_level: Option<String>,
}

fn default_kms_provider() -> KmsBackendKind {
    KmsBackendKind::Aws
}
fn default_kms_timeout() -> u64 {
    30
}
fn default_log_level() -> String {
    "warn".into()
}

impl Config {
    /// Load from the environment, apply `overrides`, and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if any value cannot be parsed or fails validation.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .set_override_option("kms_provider", overrides.kms_provider.clone())?
            .set_override_option("key_id", overrides.key_id.clone())?
            .set_override_option("aws_region", overrides.aws_region.clone())?
            .set_override_option("aws_endpoint_url", overrides.aws_endpoint_url.clone())?
            .set_override_option("aws_profile", overrides.aws_profile.clone())?
            .set_override_option("wrapped_dek_len", overrides.wrapped_dek_len.map(|n| n as i64))?
            .set_override_option("kms_timeout_secs", overrides.kms_timeout_secs.map(|n| n as i64))?
            .set_override_option("log_level", overrides.log_level.clone())?
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.key_id, "MANTLE_KEY_ID")?;
        ensure_non_empty(&self.log_level, "MANTLE_LOG_LEVEL")?;

        if self.kms_timeout_secs == 0 {
            anyhow::bail!("MANTLE_KMS_TIMEOUT_SECS must be > 0");
        }
        if self.wrapped_dek_len == Some(0) {
            anyhow::bail!("MANTLE_WRAPPED_DEK_LEN must be > 0 when set");
        }
        if self.kms_provider == KmsBackendKind::Local {
            let key = self.local_master_key.as_deref().unwrap_or_default();
            ensure_non_empty(key, "MANTLE_LOCAL_MASTER_KEY")?;
        }
        Ok(())
    }

    /// The key reference handed to the KMS provider.
    pub fn key_ref(&self) -> KeyRef {
        KeyRef::new(self.key_id.as_str())
    }

    /// Codec options for a provider whose natural wrapped length is `provider_wrapped_len`.
    pub fn codec_options(&self, provider_wrapped_len: usize) -> CodecOptions {
        CodecOptions::new(self.wrapped_dek_len.unwrap_or(provider_wrapped_len))
            .kms_timeout(Duration::from_secs(self.kms_timeout_secs))
    }

    /// A valid configuration for unit tests.
    #[cfg(test)]
    pub fn for_tests(kms_provider: KmsBackendKind) -> Self {
        use base64::{engine::general_purpose::STANDARD, Engine as _};

        Self {
            kms_provider,
            key_id: "alias/mantle-test".into(),
            aws_region: Some("us-east-1".into()),
            aws_endpoint_url: None,
            aws_profile: None,
            local_master_key: Some(STANDARD.encode([0x5Cu8; 32])),
            wrapped_dek_len: None,
            kms_timeout_secs: default_kms_timeout(),
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}
