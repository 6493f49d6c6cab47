//! `mantle`: envelope encryption CLI entry point.
//!
//! Startup sequence:
//! 1. Parse command-line flags.
//! 2. Load and validate [`Config`] from `MANTLE_*` environment variables plus flag overrides.
//! 3. Initialise structured logging on stderr.
//! 4. Build the configured KMS provider.
//! 5. Run the requested command.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use mantle::cli::{self, Cli, Command};
use mantle::config::Config;
use mantle::kms::{Kms, KmsProvider};
use mantle::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Flags
    // -----------------------------------------------------------------------
    let flags = Cli::parse();

    // -----------------------------------------------------------------------
    // 2. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::load(&flags.overrides()).map_err(|e| {
        // Logging is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 3. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&cfg.log_level, cfg.log_json)?;

    // -----------------------------------------------------------------------
    // 4. KMS provider
    // -----------------------------------------------------------------------
    let kms = Kms::from_config(&cfg).await?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        kms = kms.name(),
        key_id = %cfg.key_ref(),
        "mantle starting"
    );

    // -----------------------------------------------------------------------
    // 5. Command
    // -----------------------------------------------------------------------
    let mut stdout = std::io::stdout();
    match &flags.command {
        Command::Encrypt(args) => cli::encrypt::run(&cfg, kms, args, &mut stdout).await,
        Command::Decrypt(args) => cli::decrypt::run(&cfg, kms, args, &mut stdout).await,
    }
}
