//! Atomic snapshot writes
//!
//! The snapshot is written to a uniquely named temp file in the same
//! directory, fsynced, renamed over the target, and the directory is synced.
//! A crash at any point leaves either the old snapshot or the new one.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);
pub(crate) const TEMP_PREFIX: &str = ".repochat.tmp.";

pub fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("snapshot path `{}` has no parent directory", path.display()),
        )
    })?;
    fs::create_dir_all(parent)?;

    let tmp_path = temp_path(parent, path)?;
    let mut tmp_file = OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&tmp_path)?;

    let result = (|| -> io::Result<()> {
        tmp_file.write_all(bytes)?;
        tmp_file.flush()?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        replace(&tmp_path, path)?;
        sync_dir(parent)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn replace(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        // Windows refuses to rename over an existing file
        Err(err) if to.exists() => {
            fs::remove_file(to).map_err(|_| err)?;
            fs::rename(from, to)
        }
        Err(err) => Err(err),
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

fn temp_path(parent: &Path, target: &Path) -> io::Result<PathBuf> {
    let file_name = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid snapshot file name"))?;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| io::Error::other(e.to_string()))?
        .as_nanos();
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    Ok(parent.join(format!(
        "{TEMP_PREFIX}{file_name}.{nanos}.{}.{counter}",
        std::process::id()
    )))
}
