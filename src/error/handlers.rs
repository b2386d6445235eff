//! Error handlers
//!
//! Turns gateway errors into diagnostics for the host.

use crate::error::types::{ConfinementError, GatewayError};
use log::{Level, log};

/// Log level a gateway error is reported at
pub fn error_level(err: &GatewayError) -> Level {
    match err {
        GatewayError::UnrecognizedEvent(_) => Level::Warn,
        GatewayError::Confinement(ConfinementError::BaseMissing(_)) => Level::Warn,
        GatewayError::Confinement(_) => Level::Error,
        GatewayError::Storage { error, .. } if error.is_anticipated() => Level::Warn,
        GatewayError::Storage { .. } => Level::Error,
    }
}

/// Emit exactly one log record for a refused event
pub fn report(err: &GatewayError) {
    log!(error_level(err), "{}", err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::types::{Operation, StorageError};
    use std::path::PathBuf;

    #[test]
    fn escapes_are_errors_and_missing_base_is_a_warning() {
        let escape = GatewayError::from(ConfinementError::Escapes {
            resolved: PathBuf::from("/tmp"),
            base: PathBuf::from("/tmp/base"),
        });
        assert_eq!(error_level(&escape), Level::Error);

        let missing = GatewayError::from(ConfinementError::BaseMissing(PathBuf::from("/nope")));
        assert_eq!(error_level(&missing), Level::Warn);
    }

    #[test]
    fn unanticipated_storage_errors_are_errors() {
        let err = GatewayError::Storage {
            operation: Operation::WriteFile,
            path: PathBuf::from("/tmp/base/f"),
            error: StorageError::Io(std::io::Error::other("boom")),
        };
        assert_eq!(error_level(&err), Level::Error);
    }
}
