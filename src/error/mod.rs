// Error types for the jump trainer
//
// This module defines custom error types for recording and analysis
// operations, providing structured error handling with numeric error codes.

mod analysis;
mod recording;

pub use analysis::{log_analysis_error, AnalysisError, AnalysisErrorCodes};
pub use recording::{log_recording_error, RecordingError, RecordingErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the library and CLI boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_trait() {
        let recording: &dyn ErrorCode = &RecordingError::Malformed {
            reason: "x".to_string(),
        };
        assert_eq!(recording.code(), 3002);

        let analysis: &dyn ErrorCode = &AnalysisError::WorkerFailed {
            pipeline: "phase".to_string(),
            reason: "x".to_string(),
        };
        assert_eq!(analysis.code(), 4002);
    }

    #[test]
    fn test_error_propagation() {
        fn may_fail() -> Result<(), RecordingError> {
            Err(RecordingError::Malformed {
                reason: "empty".to_string(),
            })
        }

        fn caller() -> Result<(), AnalysisError> {
            may_fail()?;
            Ok(())
        }

        assert!(matches!(caller(), Err(AnalysisError::SourceUnavailable(_))));
    }
}
