// Segment list restore errors

use crate::error::ErrorCode;
use std::fmt;

/// Segment error code constants
///
/// Error code range: 4001-4005
pub struct SegmentErrorCodes {}

impl SegmentErrorCodes {
    /// First segment does not start at zero
    pub const NOT_ANCHORED: i32 = 4001;

    /// Gap or overlap between consecutive segments
    pub const NOT_CONTIGUOUS: i32 = 4002;

    /// Segment with end <= start
    pub const EMPTY_SEGMENT: i32 = 4003;

    /// Two segments share an id
    pub const DUPLICATE_ID: i32 = 4004;

    /// Timeline length differs from the loaded recording
    pub const DURATION_MISMATCH: i32 = 4005;
}

/// Invariant violations detected when restoring a persisted segment list
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentError {
    NotAnchored { start_time: f64 },
    NotContiguous { index: usize, end_time: f64, next_start: f64 },
    EmptySegment { index: usize },
    DuplicateId { id: u64 },
    DurationMismatch { expected: f64, actual: f64 },
}

impl ErrorCode for SegmentError {
    fn code(&self) -> i32 {
        match self {
            SegmentError::NotAnchored { .. } => SegmentErrorCodes::NOT_ANCHORED,
            SegmentError::NotContiguous { .. } => SegmentErrorCodes::NOT_CONTIGUOUS,
            SegmentError::EmptySegment { .. } => SegmentErrorCodes::EMPTY_SEGMENT,
            SegmentError::DuplicateId { .. } => SegmentErrorCodes::DUPLICATE_ID,
            SegmentError::DurationMismatch { .. } => SegmentErrorCodes::DURATION_MISMATCH,
        }
    }

    fn message(&self) -> String {
        match self {
            SegmentError::NotAnchored { start_time } => {
                format!("First segment must start at 0 (starts at {})", start_time)
            }
            SegmentError::NotContiguous {
                index,
                end_time,
                next_start,
            } => format!(
                "Segment {} ends at {} but the next one starts at {}",
                index, end_time, next_start
            ),
            SegmentError::EmptySegment { index } => {
                format!("Segment {} has zero or negative duration", index)
            }
            SegmentError::DuplicateId { id } => format!("Segment id {} appears twice", id),
            SegmentError::DurationMismatch { expected, actual } => format!(
                "Timeline covers {} s but the recording is {} s long",
                actual, expected
            ),
        }
    }
}

impl fmt::Display for SegmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SegmentError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SegmentError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_error_codes() {
        assert_eq!(
            SegmentError::NotAnchored { start_time: 1.0 }.code(),
            SegmentErrorCodes::NOT_ANCHORED
        );
        assert_eq!(
            SegmentError::DurationMismatch {
                expected: 8.0,
                actual: 12.0
            }
            .code(),
            SegmentErrorCodes::DURATION_MISMATCH
        );
    }

    #[test]
    fn test_duration_mismatch_display() {
        let err = SegmentError::DurationMismatch {
            expected: 8.0,
            actual: 12.0,
        };
        let display = format!("{}", err);
        assert!(display.contains("4005"));
        assert!(display.contains("12"));
    }
}
