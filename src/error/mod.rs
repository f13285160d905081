// Error types for the rehearsal timeline core
//
// This module defines custom error types for analysis, segment-list restore,
// and export operations, each carrying a numeric code so collaborators can
// branch on failures without parsing messages.

mod analysis;
mod export;
mod segment;

pub use analysis::{log_analysis_error, AnalysisError, AnalysisErrorCodes};
pub use export::{log_export_error, ExportError, ExportErrorCodes};
pub use segment::{SegmentError, SegmentErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
