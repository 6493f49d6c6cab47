//! `mantle encrypt`: seal a file into an envelope.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{error, info};

use crate::config::Config;
use crate::envelope::EnvelopeCodec;
use crate::files;
use crate::kms::KmsProvider;

pub const BEGIN_MARKER: &str = "-----BEGIN (ENCRYPTED DATA + DEK) STRING-----";
pub const END_MARKER: &str = "-----END (ENCRYPTED DATA + DEK) STRING-----";

#[derive(Debug, Clone, Args)]
pub struct EncryptArgs {
    /// Path of file to encrypt
    #[arg(short = 'f', long, default_value = "./plain.txt")]
    pub filepath: PathBuf,

    /// Path of file to write the envelope to
    #[arg(short = 't', long, default_value = "./cipher.txt")]
    pub target_filepath: PathBuf,

    /// Disable use of newline chars in the envelope
    #[arg(short = 's', long)]
    pub single_line: bool,

    /// Disable validation of the envelope
    #[arg(short = 'd', long)]
    pub disable_validation: bool,

    /// Keep the plaintext file after encryption
    #[arg(short = 'r', long)]
    pub retain_plaintext: bool,
}

/// Read the plaintext, seal it, print and persist the envelope, then wipe the source.
pub async fn run<P: KmsProvider>(
    cfg: &Config,
    kms: P,
    args: &EncryptArgs,
    out: &mut impl Write,
) -> Result<()> {
    info!(path = %args.filepath.display(), kms = kms.name(), "encrypting");
    let plaintext = files::read(&args.filepath)?;

    let options = cfg
        .codec_options(kms.default_wrapped_len())
        .single_line(args.single_line)
        .validate(!args.disable_validation);
    let codec = EnvelopeCodec::new(kms, cfg.key_ref(), options);

    let envelope = codec
        .seal(&plaintext)
        .await
        .inspect_err(|e| error!(kind = e.kind(), "encryption failed"))
        .context("encryption failed")?;

    writeln!(out, "{BEGIN_MARKER}")?;
    writeln!(out, "{envelope}")?;
    writeln!(out, "{END_MARKER}")?;

    files::write_output(&args.target_filepath, envelope.as_bytes())?;
    writeln!(
        out,
        "Encryption successful, ciphertext available at {}",
        args.target_filepath.display()
    )?;

    if !args.retain_plaintext {
        files::secure_delete(&args.filepath)?;
    }
    Ok(())
}
