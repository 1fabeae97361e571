use crate::error::ErrorCode;
use fs2::FileExt;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

/// Advisory lock errors for the work-unit snapshot.
#[derive(Debug)]
pub enum LockError {
    Timeout { path: PathBuf, waited: Duration },
    IoError(io::Error),
}

impl From<io::Error> for LockError {
    fn from(err: io::Error) -> Self {
        Self::IoError(err)
    }
}

impl LockError {
    /// Machine-readable code associated with this lock error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::IoError(_) => ErrorCode::SnapshotWriteFailed,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

impl std::fmt::Display for LockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout { path, waited } => {
                write!(
                    f,
                    "{}: lock timed out after {:?} at {}",
                    self.code().code(),
                    waited,
                    path.display()
                )
            }
            Self::IoError(err) => write!(f, "{}: {}", self.code().code(), err),
        }
    }
}

impl std::error::Error for LockError {}

#[derive(Debug, Clone, Copy)]
enum LockKind {
    Shared,
    Exclusive,
}

/// RAII advisory lock on the store's lock file.
///
/// Readers take it shared, writers exclusive. The lock only serializes
/// individual loads and saves; it is not held across a load-mutate-save
/// cycle.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Acquire an exclusive lock, polling until `timeout`.
    pub fn exclusive(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Self::acquire(path, timeout, LockKind::Exclusive)
    }

    /// Acquire a shared lock, polling until `timeout`.
    pub fn shared(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Self::acquire(path, timeout, LockKind::Shared)
    }

    fn acquire(path: &Path, timeout: Duration, kind: LockKind) -> Result<Self, LockError> {
        let parent = path.parent().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "lock path has no parent")
        })?;
        fs::create_dir_all(parent)?;

        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)?;

            // std's inherent `File` locks shadow fs2 on newer toolchains.
            let acquired = match kind {
                LockKind::Shared => FileExt::try_lock_shared(&file).is_ok(),
                LockKind::Exclusive => FileExt::try_lock_exclusive(&file).is_ok(),
            };

            if acquired {
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            if start.elapsed() >= timeout {
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }

            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Explicitly release the lock. Release also happens automatically on drop.
    pub fn release(self) {
        let _ = FileExt::unlock(&self.file);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::{LockError, StoreLock};
    use crate::error::ErrorCode;
    use std::{
        sync::{Arc, Barrier},
        thread,
        time::Duration,
    };

    #[test]
    fn exclusive_lock_acquires_and_releases() -> Result<(), LockError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("lock");
        let lock = StoreLock::exclusive(&path, Duration::from_millis(50))?;
        assert_eq!(lock.path(), path.as_path());
        lock.release();
        Ok(())
    }

    #[test]
    fn exclusive_lock_times_out_when_held() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lock");
        let _guard = StoreLock::exclusive(&path, Duration::from_millis(50)).unwrap();
        let err = StoreLock::exclusive(&path, Duration::from_millis(20)).unwrap_err();

        assert!(matches!(err, LockError::Timeout { path: ref p, .. } if *p == path));
        assert_eq!(err.code(), ErrorCode::LockContention);
        assert!(err.hint().is_some());
    }

    #[test]
    fn shared_locks_are_compatible() -> Result<(), LockError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("lock");
        let first = StoreLock::shared(&path, Duration::from_millis(50))?;
        let second = StoreLock::shared(&path, Duration::from_millis(50))?;

        first.release();
        second.release();
        Ok(())
    }

    #[test]
    fn reader_blocks_writer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lock");
        let read = StoreLock::shared(&path, Duration::from_millis(50)).unwrap();

        let write = StoreLock::exclusive(&path, Duration::from_millis(20));
        assert!(matches!(write, Err(LockError::Timeout { .. })));

        read.release();
        StoreLock::exclusive(&path, Duration::from_millis(50))
            .unwrap()
            .release();
    }

    #[test]
    fn writer_blocks_readers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lock");
        let _write = StoreLock::exclusive(&path, Duration::from_millis(50)).unwrap();

        let started = std::time::Instant::now();
        let read = StoreLock::shared(&path, Duration::from_millis(20));

        assert!(matches!(read, Err(LockError::Timeout { .. })));
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn contention_is_resolved_after_writer_releases() -> Result<(), LockError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("lock");

        let blocker = Arc::new(Barrier::new(2));
        let waiter = Arc::new(Barrier::new(2));

        let blocker_thread = Arc::clone(&blocker);
        let waiter_thread = Arc::clone(&waiter);
        let path_in_thread = path.clone();
        let handle = thread::spawn(move || {
            let _writer =
                StoreLock::exclusive(&path_in_thread, Duration::from_millis(200)).unwrap();
            blocker_thread.wait();
            waiter_thread.wait();
        });

        blocker.wait();
        assert!(matches!(
            StoreLock::shared(&path, Duration::from_millis(20)),
            Err(LockError::Timeout { .. })
        ));
        waiter.wait();
        handle.join().unwrap();

        let follow_up = StoreLock::exclusive(&path, Duration::from_millis(50))?;
        follow_up.release();
        Ok(())
    }
}
