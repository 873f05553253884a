//! Cross-process exclusive lock guarding the counter file.

use crate::error::{Result, StorageError};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

/// Delay between non-blocking lock attempts
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Held exclusive lock; released on drop
#[derive(Debug)]
pub(crate) struct CounterLock {
    #[cfg(unix)]
    _guard: nix::fcntl::Flock<fs::File>,
    #[cfg(not(unix))]
    path: PathBuf,
}

impl CounterLock {
    /// Acquire the lock at `path`, polling until `timeout` elapses
    ///
    /// The first attempt is made immediately, so a zero timeout still succeeds on an
    /// uncontended lock.
    pub(crate) async fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        let start = Instant::now();
        loop {
            if let Some(lock) = Self::try_acquire(path)? {
                return Ok(lock);
            }

            let waited = start.elapsed();
            if waited >= timeout {
                return Err(StorageError::LockTimeout {
                    path: path.to_path_buf(),
                    waited_ms: waited.as_millis() as u64,
                }
                .into());
            }

            log::debug!("Counter lock {} is held, waiting...", path.display());
            tokio::time::sleep(POLL_INTERVAL.min(timeout - waited)).await;
        }
    }

    #[cfg(unix)]
    fn try_acquire(path: &Path) -> Result<Option<Self>> {
        use nix::errno::Errno;
        use nix::fcntl::{Flock, FlockArg};

        // The lock file is never removed: unlinking it while another process waits on
        // the old inode would let two holders in at once.
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| unavailable(path, format!("failed to open lock file: {}", e)))?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(guard) => Ok(Some(Self { _guard: guard })),
            Err((_, errno)) if errno == Errno::EWOULDBLOCK => Ok(None),
            Err((_, errno)) => Err(unavailable(path, format!("flock error: {}", errno)).into()),
        }
    }

    #[cfg(not(unix))]
    fn try_acquire(path: &Path) -> Result<Option<Self>> {
        match fs::OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(_) => Ok(Some(Self {
                path: path.to_path_buf(),
            })),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(unavailable(path, format!("failed to create lock file: {}", e)).into()),
        }
    }
}

#[cfg(not(unix))]
impl Drop for CounterLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn unavailable(path: &Path, reason: String) -> StorageError {
    StorageError::Unavailable {
        path: PathBuf::from(path),
        reason,
    }
}
