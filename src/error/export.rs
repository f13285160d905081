// Export error types and constants

use crate::error::{AnalysisError, ErrorCode};
use log::error;
use std::fmt;

/// Export error code constants
///
/// Error code range: 5001-5003
pub struct ExportErrorCodes {}

impl ExportErrorCodes {
    /// Nothing left to export after filtering
    pub const NO_SEGMENTS: i32 = 5001;

    /// Writing the output file failed
    pub const IO: i32 = 5002;

    /// Reading the selected ranges from the source failed
    pub const SOURCE: i32 = 5003;
}

/// Log an export error with structured context
pub fn log_export_error(err: &ExportError, context: &str) {
    error!(
        "Export error in {}: code={}, component=Export, message={}",
        context,
        err.code(),
        err.message()
    );
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportError {
    NoSegments,
    Io { reason: String },
    Source(AnalysisError),
}

impl ErrorCode for ExportError {
    fn code(&self) -> i32 {
        match self {
            ExportError::NoSegments => ExportErrorCodes::NO_SEGMENTS,
            ExportError::Io { .. } => ExportErrorCodes::IO,
            ExportError::Source(_) => ExportErrorCodes::SOURCE,
        }
    }

    fn message(&self) -> String {
        match self {
            ExportError::NoSegments => "No segments selected for export".to_string(),
            ExportError::Io { reason } => format!("Failed to write export: {}", reason),
            ExportError::Source(err) => format!("Failed to read source audio: {}", err.message()),
        }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExportError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ExportError {}

impl From<hound::Error> for ExportError {
    fn from(err: hound::Error) -> Self {
        ExportError::Io {
            reason: err.to_string(),
        }
    }
}

impl From<AnalysisError> for ExportError {
    fn from(err: AnalysisError) -> Self {
        ExportError::Source(err)
    }
}
