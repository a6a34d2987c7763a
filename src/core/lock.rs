//! core::lock
//!
//! Exclusive file locks guarding archive generation.
//!
//! Two processes exporting the same ref in the same format target the same
//! archive path. The exporter takes a lock on `<archive>.lock` before
//! checking for and writing the archive, so the second process finds the
//! finished file instead of racing to write it.
//!
//! # Invariants
//!
//! - The lock is released on drop (RAII)
//! - [`FileLock::acquire`] blocks; [`FileLock::try_acquire`] never does
//! - The lock file is only unlinked by its holder, via [`FileLock::unlink`],
//!   once whatever it guards is in place. Waiters already blocked on the old
//!   file still get the lock and must re-check before doing any work.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Failed to create lock file or its directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),

    /// Failed to release the lock.
    #[error("failed to release lock: {0}")]
    ReleaseFailed(String),
}

/// An exclusive lock on a file path.
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
    /// Open handle holding the OS lock; `None` once released.
    file: Option<File>,
}

impl FileLock {
    /// Lock `path`, waiting for any other holder to release it.
    ///
    /// Parent directories are created as needed.
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        let file = Self::open(path)?;
        file.lock_exclusive()
            .map_err(|e| LockError::AcquireFailed(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
        })
    }

    /// Lock `path` if nobody else holds it, returning `None` otherwise.
    pub fn try_acquire(path: &Path) -> Result<Option<Self>, LockError> {
        let file = Self::open(path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                path: path.to_path_buf(),
                file: Some(file),
            })),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    fn open(path: &Path) -> Result<File, LockError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                LockError::CreateFailed(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e)))
    }

    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the lock file while still holding the lock.
    ///
    /// A missing file is not an error.
    pub fn unlink(&self) -> Result<(), LockError> {
        if self.file.is_none() {
            return Err(LockError::ReleaseFailed(format!(
                "{}: not held",
                self.path.display()
            )));
        }
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LockError::ReleaseFailed(format!(
                "cannot remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Release the lock before the guard goes out of scope.
    pub fn release(&mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            file.unlock()
                .map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}
