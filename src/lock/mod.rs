//! Module `lock`
//!
//! Asynchronous exclusive advisory locks over files the caller already has
//! open. Two backends provide the same contract: the native `flock` syscall
//! on unix, and the portable `fs2` locking library everywhere else. The
//! backend is chosen once per process; [`FileLock`] wraps either one with a
//! bounded wait that runs on tokio's blocking pool.
//!
//! A lock never opens or closes the file it guards. It shares the caller's
//! handle through an `Arc` and only adds or removes the advisory lock.

use log::{debug, warn};
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::io;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::{task, time};

use crate::error::LockError;

#[cfg(unix)]
pub mod native;
pub mod portable;

/// A native locking primitive that can put an exclusive lock on an open file.
///
/// Implementations block the calling thread; [`FileLock`] keeps them off the
/// async scheduler.
pub trait LockBackend: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Block until the exclusive lock on `file` is held or `deadline` passes.
    ///
    /// Returns `ErrorKind::TimedOut` once `deadline` has passed without the
    /// lock, so the calling worker never outlives the caller's wait.
    fn lock_exclusive(&self, file: &File, deadline: Instant) -> io::Result<()>;

    /// Drop the lock on `file`. Must not block.
    fn unlock(&self, file: &File) -> io::Result<()>;
}

/// Which backend to use, as named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Auto,
    Native,
    Portable,
}

impl BackendKind {
    /// The backend this kind refers to, if this platform has it.
    pub fn backend(self) -> Option<&'static dyn LockBackend> {
        match self {
            BackendKind::Auto => Some(probe()),
            #[cfg(unix)]
            BackendKind::Native => Some(&native::NativeLock),
            #[cfg(not(unix))]
            BackendKind::Native => None,
            BackendKind::Portable => Some(&portable::PortableLock),
        }
    }
}

static PROCESS_BACKEND: OnceLock<&'static dyn LockBackend> = OnceLock::new();

/// Pick the best backend this platform offers.
fn probe() -> &'static dyn LockBackend {
    #[cfg(unix)]
    return &native::NativeLock;
    #[cfg(not(unix))]
    return &portable::PortableLock;
}

/// The process-wide backend, probed on first use.
pub fn default_backend() -> &'static dyn LockBackend {
    *PROCESS_BACKEND.get_or_init(probe)
}

/// Fix the process-wide backend before anything has used it.
///
/// Returns the backend actually in effect: if one was already chosen, that
/// choice stands.
pub fn install_backend(kind: BackendKind) -> &'static dyn LockBackend {
    *PROCESS_BACKEND.get_or_init(|| kind.backend().unwrap_or_else(probe))
}

/// Bounded-wait exclusive lock factory.
#[derive(Clone, Copy)]
pub struct FileLock {
    backend: &'static dyn LockBackend,
    timeout: Duration,
}

impl FileLock {
    /// A lock using the process-wide backend.
    pub fn new(timeout: Duration) -> Self {
        Self::with_backend(default_backend(), timeout)
    }

    pub fn with_backend(backend: &'static dyn LockBackend, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Acquire an exclusive lock on `file`, waiting at most the configured timeout.
    ///
    /// The blocking acquisition runs on the blocking pool and hands its guard
    /// back over a oneshot channel. If this future times out or is dropped,
    /// the receiver goes away and the guard is dropped on the worker side
    /// instead, which releases the lock as soon as it is obtained.
    pub async fn acquire(&self, file: &Arc<File>) -> Result<FileLockGuard, LockError> {
        let (tx, rx) = oneshot::channel();
        let handle = Arc::clone(file);
        let backend = self.backend;
        let deadline = Instant::now() + self.timeout;

        task::spawn_blocking(move || {
            let outcome = backend
                .lock_exclusive(&handle, deadline)
                .map(|()| FileLockGuard {
                    file: handle,
                    backend,
                    held: true,
                });
            let _ = tx.send(outcome);
        });

        match time::timeout(self.timeout, rx).await {
            Ok(Ok(Ok(guard))) => {
                debug!("Acquired exclusive {} lock", backend.name());
                Ok(guard)
            }
            Ok(Ok(Err(e))) if e.kind() == io::ErrorKind::TimedOut => {
                Err(LockError::Timeout(self.timeout))
            }
            Ok(Ok(Err(e))) => Err(LockError::Io(e)),
            Ok(Err(_)) => Err(LockError::WorkerLost),
            Err(_) => Err(LockError::Timeout(self.timeout)),
        }
    }
}

impl fmt::Debug for FileLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileLock")
            .field("backend", &self.backend.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// A held exclusive lock. Released by [`FileLockGuard::release`] or on drop.
pub struct FileLockGuard {
    file: Arc<File>,
    backend: &'static dyn LockBackend,
    held: bool,
}

impl FileLockGuard {
    /// The locked file.
    pub fn file(&self) -> &File {
        &self.file
    }

    /// Release the lock, reporting any failure to do so.
    pub fn release(mut self) -> io::Result<()> {
        self.held = false;
        self.backend.unlock(&self.file)
    }
}

impl Drop for FileLockGuard {
    fn drop(&mut self) {
        if self.held {
            if let Err(e) = self.backend.unlock(&self.file) {
                warn!("Failed to release {} lock: {}", self.backend.name(), e);
            }
        }
    }
}

impl fmt::Debug for FileLockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileLockGuard")
            .field("backend", &self.backend.name())
            .field("held", &self.held)
            .finish()
    }
}
