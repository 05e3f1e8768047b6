// Recording error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Recording error code constants
///
/// Single source of truth for the numeric codes attached to
/// [`RecordingError`] variants.
///
/// Error code range: 3001-3004
pub struct RecordingErrorCodes {}

impl RecordingErrorCodes {
    /// Recording file could not be read
    pub const UNREADABLE: i32 = 3001;

    /// Recording file is not a valid pose recording
    pub const MALFORMED: i32 = 3002;

    /// Named recording does not exist in the catalog
    pub const NOT_FOUND: i32 = 3003;

    /// Recording could not be written
    pub const WRITE_FAILED: i32 = 3004;
}

/// Log a recording error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_recording_error(err: &RecordingError, context: &str) {
    error!(
        "Recording error in {}: code={}, component=RecordingCatalog, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Recording-related errors
///
/// These are setup failures: the frame source could not be opened or
/// decoded, so no pipeline can run.
///
/// Error code range: 3001-3004
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingError {
    /// Recording file could not be read
    Unreadable { path: String, reason: String },

    /// Recording contents failed to parse or validate
    Malformed { reason: String },

    /// No recording with this name in the catalog root
    NotFound { name: String, root: String },

    /// Recording could not be written to disk
    WriteFailed { path: String, reason: String },
}

impl ErrorCode for RecordingError {
    fn code(&self) -> i32 {
        match self {
            RecordingError::Unreadable { .. } => RecordingErrorCodes::UNREADABLE,
            RecordingError::Malformed { .. } => RecordingErrorCodes::MALFORMED,
            RecordingError::NotFound { .. } => RecordingErrorCodes::NOT_FOUND,
            RecordingError::WriteFailed { .. } => RecordingErrorCodes::WRITE_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            RecordingError::Unreadable { path, reason } => {
                format!("Cannot open recording {}: {}", path, reason)
            }
            RecordingError::Malformed { reason } => {
                format!("Malformed recording: {}", reason)
            }
            RecordingError::NotFound { name, root } => {
                format!("Recording '{}' not found in {}", name, root)
            }
            RecordingError::WriteFailed { path, reason } => {
                format!("Failed to write recording {}: {}", path, reason)
            }
        }
    }
}

impl fmt::Display for RecordingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RecordingError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for RecordingError {}

impl From<serde_json::Error> for RecordingError {
    fn from(err: serde_json::Error) -> Self {
        RecordingError::Malformed {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_error_codes() {
        assert_eq!(
            RecordingError::Unreadable {
                path: "a.json".to_string(),
                reason: "missing".to_string()
            }
            .code(),
            RecordingErrorCodes::UNREADABLE
        );
        assert_eq!(
            RecordingError::Malformed {
                reason: "bad".to_string()
            }
            .code(),
            3002
        );
        assert_eq!(
            RecordingError::NotFound {
                name: "jump".to_string(),
                root: "fixtures".to_string()
            }
            .code(),
            3003
        );
    }

    #[test]
    fn test_recording_error_messages() {
        let err = RecordingError::Unreadable {
            path: "clip.json".to_string(),
            reason: "No such file".to_string(),
        };
        assert_eq!(err.message(), "Cannot open recording clip.json: No such file");

        let err = RecordingError::NotFound {
            name: "jump".to_string(),
            root: "fixtures".to_string(),
        };
        assert!(err.message().contains("'jump' not found"));
    }

    #[test]
    fn test_serde_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{ not json").unwrap_err();
        let err: RecordingError = parse_err.into();
        assert!(matches!(err, RecordingError::Malformed { .. }));
        assert!(format!("{}", err).contains("3002"));
    }
}
