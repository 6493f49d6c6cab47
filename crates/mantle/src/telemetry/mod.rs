//! Telemetry initialisation for the `mantle` CLI.
//!
//! Structured logs only, written to stderr so stdout stays free for envelope
//! text and decrypted plaintext.
//!
//! # Telemetry invariants
//!
//! - **No plaintext or key material** must appear in any log field. Only
//!   lengths, provider names, and error kinds are recorded.
//! - Log level is configurable via `MANTLE_LOG_LEVEL` (default: `warn`);
//!   `RUST_LOG` takes precedence when set.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the subscriber has already been set.
pub fn init(log_level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter);

    let res = if json {
        builder.json().try_init()
    } else {
        builder.compact().with_target(false).try_init()
    };
    res.map_err(|e| anyhow::anyhow!("failed to initialise tracing subscriber: {e}"))
}
