//! `mantle decrypt`: open an envelope file back into plaintext.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use mantle_common::EnvelopeError;
use tracing::{error, info};

use crate::config::Config;
use crate::envelope::EnvelopeCodec;
use crate::files;
use crate::kms::KmsProvider;

#[derive(Debug, Clone, Args)]
pub struct DecryptArgs {
    /// Path of file to get the envelope from
    #[arg(short = 'f', long, default_value = "./cipher.txt")]
    pub filepath: PathBuf,

    /// Path of file to write the decrypted plaintext to
    #[arg(short = 't', long, default_value = "./plain.txt")]
    pub target_filepath: PathBuf,

    /// Keep the envelope file after decryption
    #[arg(short = 'r', long)]
    pub retain_ciphertext: bool,

    /// Only check that the envelope decrypts; write and delete nothing
    #[arg(short = 'v', long)]
    pub validate: bool,

    /// Write the decrypted plaintext to stdout instead of a file
    #[arg(short = 'o', long)]
    pub stdout: bool,
}

/// Read the envelope, open it, and deliver the plaintext.
pub async fn run<P: KmsProvider>(
    cfg: &Config,
    kms: P,
    args: &DecryptArgs,
    out: &mut impl Write,
) -> Result<()> {
    info!(path = %args.filepath.display(), kms = kms.name(), "decrypting");
    let raw = files::read(&args.filepath)?;

    let options = cfg.codec_options(kms.default_wrapped_len());
    let codec = EnvelopeCodec::new(kms, cfg.key_ref(), options);
    let opened = match String::from_utf8(raw) {
        Ok(text) => codec.open(&text).await,
        Err(e) => Err(EnvelopeError::DecodeFailure(format!("envelope is not text: {e}"))),
    };
    let plaintext = opened
        .inspect_err(|e| error!(kind = e.kind(), "decryption failed"))
        .context("decryption failed")?;

    if args.validate {
        writeln!(out, "Validation completed successfully")?;
        return Ok(());
    }

    if args.stdout {
        out.write_all(&plaintext)?;
        out.flush()?;
    } else {
        files::write_output(&args.target_filepath, &plaintext)?;
        writeln!(
            out,
            "Decryption successful, plaintext available at {}",
            args.target_filepath.display()
        )?;
    }

    if !args.retain_ciphertext {
        files::secure_delete(&args.filepath)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use mantle_common::KmsBackendKind;

    use super::*;
    use crate::cli::encrypt::{self, EncryptArgs};
    use crate::kms::LocalKms;

    fn kms() -> LocalKms {
        LocalKms::from_key([0x5C; 32])
    }

    async fn seal_file(dir: &Path, plaintext: &[u8]) -> PathBuf {
        let args = EncryptArgs {
            filepath: dir.join("source.txt"),
            target_filepath: dir.join("cipher.txt"),
            single_line: false,
            disable_validation: false,
            retain_plaintext: false,
        };
        fs::write(&args.filepath, plaintext).unwrap();
        let cfg = Config::for_tests(KmsBackendKind::Local);
        encrypt::run(&cfg, kms(), &args, &mut Vec::<u8>::new()).await.unwrap();
        args.target_filepath
    }

    fn args(dir: &Path, cipher: PathBuf) -> DecryptArgs {
        DecryptArgs {
            filepath: cipher,
            target_filepath: dir.join("plain.txt"),
            retain_ciphertext: false,
            validate: false,
            stdout: false,
        }
    }

    #[tokio::test]
    async fn decrypts_to_file_and_wipes_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let cipher = seal_file(dir.path(), b"hello world").await;
        let args = args(dir.path(), cipher);

        let cfg = Config::for_tests(KmsBackendKind::Local);
        let mut out = Vec::new();
        run(&cfg, kms(), &args, &mut out).await.unwrap();

        assert_eq!(fs::read(&args.target_filepath).unwrap(), b"hello world");
        assert!(String::from_utf8(out).unwrap().contains("Decryption successful"));
        assert!(!args.filepath.exists());
    }

    #[tokio::test]
    async fn stdout_mode_writes_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let plaintext: Vec<u8> = (0u8..=255).collect();
        let cipher = seal_file(dir.path(), &plaintext).await;
        let mut args = args(dir.path(), cipher);
        args.stdout = true;
        args.retain_ciphertext = true;

        let cfg = Config::for_tests(KmsBackendKind::Local);
        let mut out = Vec::new();
        run(&cfg, kms(), &args, &mut out).await.unwrap();

        assert_eq!(out, plaintext);
        assert!(!args.target_filepath.exists());
        assert!(args.filepath.exists());
    }

    #[tokio::test]
    async fn validate_mode_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cipher = seal_file(dir.path(), b"check only").await;
        let mut args = args(dir.path(), cipher);
        args.validate = true;

        let cfg = Config::for_tests(KmsBackendKind::Local);
        let mut out = Vec::new();
        run(&cfg, kms(), &args, &mut out).await.unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "Validation completed successfully\n");
        assert!(args.filepath.exists());
        assert!(!args.target_filepath.exists());
    }

    #[tokio::test]
    async fn tampered_envelope_is_kept_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cipher = seal_file(dir.path(), b"do not trust").await;
        let text = fs::read_to_string(&cipher).unwrap();
        // Swap the first character for a different valid base64 character.
        let first = if text.starts_with('A') { "B" } else { "A" };
        fs::write(&cipher, format!("{first}{}", &text[1..])).unwrap();
        let args = args(dir.path(), cipher);

        let cfg = Config::for_tests(KmsBackendKind::Local);
        let err = run(&cfg, kms(), &args, &mut Vec::<u8>::new()).await.unwrap_err();
        assert!(format!("{err:#}").contains("authentication failure"));
        assert!(args.filepath.exists());
        assert!(!args.target_filepath.exists());
    }

    #[tokio::test]
    async fn binary_envelope_is_a_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let cipher = dir.path().join("cipher.txt");
        fs::write(&cipher, [0xFFu8, 0xFE, 0x00, 0x80]).unwrap();
        let args = args(dir.path(), cipher);

        let cfg = Config::for_tests(KmsBackendKind::Local);
        let err = run(&cfg, kms(), &args, &mut Vec::<u8>::new()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EnvelopeError>(),
            Some(EnvelopeError::DecodeFailure(_))
        ));
        assert!(args.filepath.exists());
        assert!(!args.target_filepath.exists());
    }

    #[tokio::test]
    async fn wrong_master_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cipher = seal_file(dir.path(), b"secret").await;
        let args = args(dir.path(), cipher);

        let cfg = Config::for_tests(KmsBackendKind::Local);
        let other = LocalKms::from_key([0x11; 32]);
        assert!(run(&cfg, other, &args, &mut Vec::<u8>::new()).await.is_err());
        assert!(args.filepath.exists());
    }
}
