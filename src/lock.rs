//! Cross-process store lock.
//!
//! The index is single-writer. Every command that may touch the index takes
//! an exclusive advisory lock on a sidecar file before opening the database,
//! and a second concurrent invocation fails fast with a clear message instead
//! of blocking or interleaving writes.

use crate::errors::{AppResult, LockError};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// An exclusive lock on the store, released on drop.
///
/// The lock file itself is left in place after release; only the advisory
/// lock is relinquished.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Acquires the store lock, failing fast if another process holds it.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::StoreBusy`] when the lock is already held and
    /// [`LockError::AcquisitionFailed`] for other I/O failures.
    pub fn acquire(lock_path: &Path) -> AppResult<Self> {
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(lock_path)
            .map_err(|source| LockError::AcquisitionFailed {
                path: lock_path.to_path_buf(),
                source,
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!("Acquired store lock at {:?}", lock_path);
                Ok(StoreLock {
                    file,
                    path: lock_path.to_path_buf(),
                })
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Err(LockError::StoreBusy {
                path: lock_path.to_path_buf(),
            }
            .into()),
            Err(source) => Err(LockError::AcquisitionFailed {
                path: lock_path.to_path_buf(),
                source,
            }
            .into()),
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            debug!("Failed to release store lock at {:?}: {}", self.path, e);
        } else {
            debug!("Released store lock at {:?}", self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_and_release() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(".bujo.lock");

        let lock = StoreLock::acquire(&lock_path).unwrap();
        assert!(lock_path.exists());
        drop(lock);

        // Reacquirable after release.
        StoreLock::acquire(&lock_path).unwrap();
    }

    #[test]
    fn test_second_acquire_fails_fast() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join(".bujo.lock");

        let _held = StoreLock::acquire(&lock_path).unwrap();
        let err = StoreLock::acquire(&lock_path).unwrap_err();
        match err {
            AppError::Lock(LockError::StoreBusy { path }) => assert_eq!(path, lock_path),
            other => panic!("Expected StoreBusy, got {:?}", other),
        }
    }

    #[test]
    fn test_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("nested").join(".bujo.lock");
        StoreLock::acquire(&lock_path).unwrap();
        assert!(lock_path.exists());
    }
}
