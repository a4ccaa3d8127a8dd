//! Lock file for single-instance enforcement.
//!
//! Two ddcbright instances stepping on the same DDC bus would fight over
//! brightness, so an exclusive lock is taken on a file in the runtime
//! directory. The lock file records our PID for diagnostics; the flock
//! itself is what prevents a second instance, so a stale file from a
//! crashed process is harmless.

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};

use anyhow::{Context, Result, bail};
use fs2::FileExt;

pub struct LockGuard {
    _file: File,
    path: String,
}

impl LockGuard {
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Acquire the single-instance lock, failing if another instance holds it.
pub fn acquire_lock() -> Result<LockGuard> {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    let path = format!("{runtime_dir}/ddcbright.lock");

    // Open without truncating so a losing racer doesn't wipe the holder's PID.
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .with_context(|| format!("failed to open lock file {path}"))?;

    if file.try_lock_exclusive().is_err() {
        let holder = std::fs::read_to_string(&path).unwrap_or_default();
        let holder = holder.lines().next().unwrap_or("unknown").to_string();
        bail!("another ddcbright instance is already running (pid {holder})");
    }

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(&file, "{}", std::process::id())?;
    file.flush()?;

    Ok(LockGuard { _file: file, path })
}
