//! Command-line interface: argument parsing and the two commands.

pub mod decrypt;
pub mod encrypt;

use clap::{Parser, Subcommand};

use crate::config::Overrides;

pub use decrypt::DecryptArgs;
pub use encrypt::EncryptArgs;

/// Envelope encryption: a fresh data key per file, wrapped by a KMS key.
#[derive(Debug, Parser)]
#[command(name = "mantle", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// KMS backend: `aws` or `local` [env: MANTLE_KMS_PROVIDER]
    #[arg(long, global = true)]
    pub kms_provider: Option<String>,

    /// Key id, ARN, or alias that wraps the data key [env: MANTLE_KEY_ID]
    #[arg(long, global = true)]
    pub key_id: Option<String>,

    /// AWS region [env: MANTLE_AWS_REGION]
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// KMS endpoint override [env: MANTLE_AWS_ENDPOINT_URL]
    #[arg(long, global = true)]
    pub endpoint_url: Option<String>,

    /// Named AWS profile [env: MANTLE_AWS_PROFILE]
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Byte length of a wrapped data key [env: MANTLE_WRAPPED_DEK_LEN]
    #[arg(long, global = true)]
    pub wrapped_dek_len: Option<usize>,

    /// Deadline for each KMS call [env: MANTLE_KMS_TIMEOUT_SECS]
    #[arg(long = "timeout", value_name = "SECS", global = true)]
    pub timeout_secs: Option<u64>,

    /// Log level, e.g. `info` or `debug` [env: MANTLE_LOG_LEVEL]
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Encrypts your data, returning everything required for future decryption
    Encrypt(EncryptArgs),
    /// Decrypts an envelope, returning the plaintext data
    Decrypt(DecryptArgs),
}

impl Cli {
    /// Flags that override environment configuration.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            kms_provider: self.kms_provider.clone(),
            key_id: self.key_id.clone(),
            aws_region: self.region.clone(),
            aws_endpoint_url: self.endpoint_url.clone(),
            aws_profile: self.profile.clone(),
            wrapped_dek_len: self.wrapped_dek_len,
            kms_timeout_secs: self.timeout_secs,
            log_level: self.log_level.clone(),
        }
    }
}
