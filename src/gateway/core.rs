use log::info;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use crate::config::GatewayConfig;
use crate::error::handlers::report;
use crate::error::{ConfinementError, GatewayError};
use crate::event::{IncomingEvent, SUPPORTED_KINDS};
use crate::lock::FileLock;
use crate::storage::filesystem::directory_exists;
use crate::storage::{confine, dispatch};

/// How long a write waits for its file lock unless configured otherwise.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Applies storage events to the file system, confined to a base directory.
///
/// The base directory is never created here; until it exists every event is
/// refused.
///
/// The base path can be changed while events are in flight. Each step of
/// `output` reads the value current at that moment, so an event racing a
/// `set_path` may be checked against one base and resolved against another.
/// The last write wins; nothing is snapshotted per event.
pub struct StorageGateway {
    base_path: RwLock<PathBuf>,
    lock: FileLock,
}

impl StorageGateway {
    /// Gateway confined to `base_path`, using the process-wide lock backend.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: RwLock::new(base_path.into()),
            lock: FileLock::new(DEFAULT_LOCK_TIMEOUT),
        }
    }

    /// Gateway built from loaded configuration.
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.base_path()).with_lock(FileLock::new(config.lock_timeout()))
    }

    /// Replace the lock used to guard file writes.
    pub fn with_lock(mut self, lock: FileLock) -> Self {
        self.lock = lock;
        self
    }

    /// The base path all events are confined to.
    pub fn path(&self) -> PathBuf {
        self.base_path
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Point the gateway at a different base path. Takes effect for the next step of any event.
    pub fn set_path(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        info!("Base path set to {}", path.display());
        *self.base_path.write().unwrap_or_else(PoisonError::into_inner) = path;
    }

    /// Whether the base path currently exists and is a directory.
    pub fn path_exists(&self) -> bool {
        directory_exists(&self.path())
    }

    /// How long a write waits for its file lock.
    pub fn lock_timeout(&self) -> Duration {
        self.lock.timeout()
    }

    /// Event kinds this gateway consumes.
    pub fn consumes_outputs() -> &'static [&'static str] {
        &SUPPORTED_KINDS
    }

    /// Apply an event. Returns whether it was applied.
    ///
    /// Refusals and failures are reported as a single log record each and
    /// never escape as errors.
    pub async fn output(&self, event: impl Into<IncomingEvent>) -> bool {
        match self.try_output(event.into()).await {
            Ok(()) => true,
            Err(err) => {
                report(&err);
                false
            }
        }
    }

    /// Apply an event, returning why it was refused.
    pub async fn try_output(&self, event: IncomingEvent) -> Result<(), GatewayError> {
        let event = match event {
            IncomingEvent::Storage(event) => event,
            IncomingEvent::Unsupported(kind) => return Err(GatewayError::UnrecognizedEvent(kind)),
        };

        if !self.path_exists() {
            return Err(ConfinementError::BaseMissing(self.path()).into());
        }

        let resolved = confine(&self.path(), event.path())?;

        dispatch(&resolved, &event, &self.lock)
            .await
            .map_err(|error| GatewayError::Storage {
                operation: event.operation(),
                path: resolved,
                error,
            })
    }
}
