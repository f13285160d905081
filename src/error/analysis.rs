// Analysis error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Analysis error code constants
///
/// Error code range: 3001-3006
pub struct AnalysisErrorCodes {}

impl AnalysisErrorCodes {
    /// Configuration rejected (window not a power of two, zero hop, ...)
    pub const INVALID_CONFIG: i32 = 3001;

    /// FFT plan or working buffers could not be set up
    pub const FFT_SETUP: i32 = 3002;

    /// Reading PCM frames from the source failed
    pub const SOURCE_READ: i32 = 3003;

    /// Source uses a sample format the reader cannot convert
    pub const UNSUPPORTED_FORMAT: i32 = 3004;

    /// Background pipeline worker panicked
    pub const WORKER_PANICKED: i32 = 3005;

    /// Background pipeline worker could not be started
    pub const WORKER_SPAWN: i32 = 3006;
}

/// Log an analysis error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_analysis_error(err: &AnalysisError, context: &str) {
    error!(
        "Analysis error in {}: code={}, component=AnalysisPipeline, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised by the analysis pipeline (stages 1-4)
///
/// Empty audio is never an error; every stage returns an empty result for it.
/// Cancellation is not represented here either: a superseded run is reported
/// through `PipelineOutcome::Superseded`.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Configuration value out of its valid domain
    InvalidConfig { field: String, reason: String },

    /// FFT plan or buffer allocation failed
    FftSetup { window_size: usize, reason: String },

    /// Reading from the PCM source failed
    SourceRead { reason: String },

    /// Sample format not convertible to normalized f32
    UnsupportedFormat { details: String },

    /// Worker thread died before publishing a result
    WorkerPanicked,

    /// The OS refused to start the worker thread
    WorkerSpawn { reason: String },
}

impl ErrorCode for AnalysisError {
    fn code(&self) -> i32 {
        match self {
            AnalysisError::InvalidConfig { .. } => AnalysisErrorCodes::INVALID_CONFIG,
            AnalysisError::FftSetup { .. } => AnalysisErrorCodes::FFT_SETUP,
            AnalysisError::SourceRead { .. } => AnalysisErrorCodes::SOURCE_READ,
            AnalysisError::UnsupportedFormat { .. } => AnalysisErrorCodes::UNSUPPORTED_FORMAT,
            AnalysisError::WorkerPanicked => AnalysisErrorCodes::WORKER_PANICKED,
            AnalysisError::WorkerSpawn { .. } => AnalysisErrorCodes::WORKER_SPAWN,
        }
    }

    fn message(&self) -> String {
        match self {
            AnalysisError::InvalidConfig { field, reason } => {
                format!("Invalid configuration for {}: {}", field, reason)
            }
            AnalysisError::FftSetup {
                window_size,
                reason,
            } => {
                format!("FFT setup failed for window size {}: {}", window_size, reason)
            }
            AnalysisError::SourceRead { reason } => {
                format!("Failed to read PCM source: {}", reason)
            }
            AnalysisError::UnsupportedFormat { details } => {
                format!("Unsupported sample format: {}", details)
            }
            AnalysisError::WorkerPanicked => {
                "Analysis worker terminated before publishing a result".to_string()
            }
            AnalysisError::WorkerSpawn { reason } => {
                format!("Failed to start analysis worker: {}", reason)
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

impl std::error::Error for AnalysisError {}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::SourceRead {
            reason: err.to_string(),
        }
    }
}

impl From<hound::Error> for AnalysisError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::Unsupported => AnalysisError::UnsupportedFormat {
                details: "WAV feature not supported".to_string(),
            },
            other => AnalysisError::SourceRead {
                reason: other.to_string(),
            },
        }
    }
}
