//! File lifecycle around the codec: reading inputs, writing outputs, and
//! secure deletion of consumed sources.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::crypto::random::{OsRandom, RandomSource};

/// Mode for plaintext and envelope files written by the CLI.
#[cfg(unix)]
const OUTPUT_MODE: u32 = 0o644;

/// Overwrite granularity for [`secure_delete`].
const WIPE_CHUNK: usize = 64 * 1024;

/// Read a whole file.
pub fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Write `contents` to `path`, replacing any existing file.
pub fn write_output(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(OUTPUT_MODE))
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }
    Ok(())
}

/// Overwrite a file's contents with random bytes, flush to disk, then remove it.
///
/// Unlike a plain unlink, the original bytes do not survive in the freed
/// blocks on filesystems that overwrite in place.
pub fn secure_delete(path: &Path) -> Result<()> {
    let len = fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?
        .len();

    let mut file = fs::OpenOptions::new()
        .write(true)
        .open(path)
        .with_context(|| format!("failed to open {} for wiping", path.display()))?;

    let mut chunk = vec![0u8; WIPE_CHUNK];
    let mut remaining = len;
    while remaining > 0 {
        let n = remaining.min(WIPE_CHUNK as u64) as usize;
        OsRandom.fill(&mut chunk[..n])?;
        file.write_all(&chunk[..n])
            .with_context(|| format!("failed to overwrite {}", path.display()))?;
        remaining -= n as u64;
    }
    file.sync_all()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    drop(file);

    fs::remove_file(path).with_context(|| format!("failed to remove {}", path.display()))?;
    debug!(path = %path.display(), bytes = len, "file securely deleted");
    Ok(())
}
