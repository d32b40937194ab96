//! # Data Directory Locking
//!
//! Keeps a second node process away from a block log that is open. Two
//! writers appending to the same log would interleave records.
//!
//! Uses `fs2` for cross-platform file locking (flock on Unix, LockFile on
//! Windows).

use crate::domain::{BlockLogError, BlockLogResult};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Exclusive lock on a data directory, released on drop.
#[derive(Debug)]
pub struct DirectoryLock {
    file: File,
    path: PathBuf,
    pid: u32,
}

impl DirectoryLock {
    const LOCK_FILE: &'static str = "LOCK";

    /// Fails with [`BlockLogError::Locked`] when another handle holds the
    /// lock.
    pub fn acquire(data_dir: &Path) -> BlockLogResult<Self> {
        let path = data_dir.join(Self::LOCK_FILE);
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        if file.try_lock_exclusive().is_err() {
            return Err(BlockLogError::Locked {
                pid: Self::read_existing_pid(&path),
                path,
            });
        }

        let pid = std::process::id();
        file.set_len(0)?;
        writeln!(file, "{pid}")?;
        file.sync_all()?;

        Ok(Self { file, path, pid })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_existing_pid(path: &Path) -> Option<u32> {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }
}

impl Drop for DirectoryLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        let _ = std::fs::remove_file(&self.path);
    }
}
