//! Error types
//!
//! Defines domain-specific error types for each module of the storage gateway.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Path confinement errors
#[derive(Debug)]
pub enum ConfinementError {
    BaseMissing(PathBuf),
    Escapes { resolved: PathBuf, base: PathBuf },
    Unresolvable(PathBuf, io::Error),
}

impl fmt::Display for ConfinementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfinementError::BaseMissing(base) => {
                write!(f, "Cannot output - base path '{}' does not exist", base.display())
            }
            ConfinementError::Escapes { resolved, base } => write!(
                f,
                "Refusing to write to {}, as it would result in a file outside of {}",
                resolved.display(),
                base.display()
            ),
            ConfinementError::Unresolvable(path, e) => write!(
                f,
                "Refusing to write to {}, as it could not be resolved: {}",
                path.display(),
                e
            ),
        }
    }
}

impl std::error::Error for ConfinementError {}

/// File lock errors
#[derive(Debug)]
pub enum LockError {
    Timeout(Duration),
    WorkerLost,
    Io(io::Error),
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockError::Timeout(timeout) => {
                write!(f, "lock not acquired within {:?}", timeout)
            }
            LockError::WorkerLost => write!(f, "lock worker exited without reporting"),
            LockError::Io(e) => write!(f, "lock failed: {}", e),
        }
    }
}

impl std::error::Error for LockError {}

impl From<io::Error> for LockError {
    fn from(error: io::Error) -> Self {
        LockError::Io(error)
    }
}

/// Storage operation errors
///
/// Every variant except `Io` is an anticipated failure kind.
#[derive(Debug)]
pub enum StorageError {
    AlreadyExists,
    PermissionDenied,
    NotFound,
    IsADirectory,
    NotADirectory,
    LockTimeout(Duration),
    Io(io::Error),
}

impl StorageError {
    /// Whether this failure is part of the anticipated taxonomy.
    pub fn is_anticipated(&self) -> bool {
        !matches!(self, StorageError::Io(_))
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::AlreadyExists => write!(f, "already exists"),
            StorageError::PermissionDenied => write!(f, "permission denied"),
            StorageError::NotFound => write!(f, "not found"),
            StorageError::IsADirectory => write!(f, "is a directory"),
            StorageError::NotADirectory => write!(f, "not a directory"),
            StorageError::LockTimeout(timeout) => {
                write!(f, "lock not acquired within {:?}", timeout)
            }
            StorageError::Io(e) => write!(f, "unexpected I/O error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::AlreadyExists => StorageError::AlreadyExists,
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied,
            io::ErrorKind::NotFound => StorageError::NotFound,
            io::ErrorKind::IsADirectory => StorageError::IsADirectory,
            io::ErrorKind::NotADirectory => StorageError::NotADirectory,
            _ => StorageError::Io(error),
        }
    }
}

impl From<LockError> for StorageError {
    fn from(error: LockError) -> Self {
        match error {
            LockError::Timeout(timeout) => StorageError::LockTimeout(timeout),
            LockError::WorkerLost => StorageError::Io(io::Error::other(error.to_string())),
            LockError::Io(e) => StorageError::from(e),
        }
    }
}

/// Which operation a storage failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateDirectory,
    WriteFile,
    DeleteFile,
}

/// General gateway error that encompasses every reason `output` can refuse an event
#[derive(Debug)]
pub enum GatewayError {
    UnrecognizedEvent(String),
    Confinement(ConfinementError),
    Storage {
        operation: Operation,
        path: PathBuf,
        error: StorageError,
    },
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::UnrecognizedEvent(kind) => {
                write!(f, "Received unexpected event type {}", kind)
            }
            GatewayError::Confinement(e) => write!(f, "{}", e),
            GatewayError::Storage {
                operation,
                path,
                error,
            } => match operation {
                Operation::CreateDirectory => {
                    write!(f, "Unable to create directory {} - {}", path.display(), error)
                }
                Operation::WriteFile => {
                    write!(f, "Unable to write file {} - {}", path.display(), error)
                }
                Operation::DeleteFile => {
                    write!(f, "Unable to delete {} - {}", path.display(), error)
                }
            },
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<ConfinementError> for GatewayError {
    fn from(error: ConfinementError) -> Self {
        GatewayError::Confinement(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_anticipated_kinds() {
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert!(matches!(StorageError::from(denied), StorageError::PermissionDenied));

        let exists = io::Error::from(io::ErrorKind::AlreadyExists);
        assert!(matches!(StorageError::from(exists), StorageError::AlreadyExists));

        let other = io::Error::other("disk on fire");
        let mapped = StorageError::from(other);
        assert!(!mapped.is_anticipated());
    }

    #[test]
    fn lock_timeout_becomes_storage_lock_timeout() {
        let mapped = StorageError::from(LockError::Timeout(Duration::from_millis(250)));
        assert_eq!(mapped.to_string(), "lock not acquired within 250ms");
    }

    #[test]
    fn storage_messages_name_the_path() {
        let err = GatewayError::Storage {
            operation: Operation::DeleteFile,
            path: PathBuf::from("/srv/out/missing.txt"),
            error: StorageError::NotFound,
        };
        assert_eq!(err.to_string(), "Unable to delete /srv/out/missing.txt - not found");
    }
}
