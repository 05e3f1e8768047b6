// Analysis error types and constants

use crate::error::{ErrorCode, RecordingError};
use log::error;
use std::fmt;

/// Analysis error code constants
///
/// Error code range: 4001-4003
pub struct AnalysisErrorCodes {}

impl AnalysisErrorCodes {
    /// No frame of the stream contained a person
    pub const NO_PERSON_DETECTED: i32 = 4001;

    /// A pipeline worker failed or panicked
    pub const WORKER_FAILED: i32 = 4002;

    /// The frame source failed to open
    pub const SOURCE_UNAVAILABLE: i32 = 4003;
}

/// Log an analysis error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_analysis_error(err: &AnalysisError, context: &str) {
    error!(
        "Analysis error in {}: code={}, component=Pipeline, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Terminal analysis failures
///
/// Per-frame missing data never produces one of these; it degrades to
/// undefined metrics instead.
///
/// Error code range: 4001-4003
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// The named pipeline never saw a person in any frame
    NoPersonDetected { pipeline: String, frames: usize },

    /// The named pipeline's worker failed before producing a result
    WorkerFailed { pipeline: String, reason: String },

    /// The frame source could not be opened
    SourceUnavailable(RecordingError),
}

impl ErrorCode for AnalysisError {
    fn code(&self) -> i32 {
        match self {
            AnalysisError::NoPersonDetected { .. } => AnalysisErrorCodes::NO_PERSON_DETECTED,
            AnalysisError::WorkerFailed { .. } => AnalysisErrorCodes::WORKER_FAILED,
            AnalysisError::SourceUnavailable(_) => AnalysisErrorCodes::SOURCE_UNAVAILABLE,
        }
    }

    fn message(&self) -> String {
        match self {
            AnalysisError::NoPersonDetected { pipeline, frames } => {
                format!(
                    "No person detected by {} pipeline in {} frames",
                    pipeline, frames
                )
            }
            AnalysisError::WorkerFailed { pipeline, reason } => {
                format!("{} pipeline failed: {}", pipeline, reason)
            }
            AnalysisError::SourceUnavailable(inner) => {
                format!("Frame source unavailable: {}", inner.message())
            }
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AnalysisError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnalysisError::SourceUnavailable(inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<RecordingError> for AnalysisError {
    fn from(err: RecordingError) -> Self {
        AnalysisError::SourceUnavailable(err)
    }
}
