// Segment list - the editable timeline produced by the analysis pipeline
//
// Segments live in an ordered arena owned by `SegmentList`. Identity is an
// opaque `SegmentId` allocated from the list's counter, so in-place edits
// keep ids stable while split halves get fresh ones.
//
// Invariants (checked by `restore`, preserved by every edit in `edit.rs`):
// - ordered by start time
// - contiguous: segment[i].end_time == segment[i + 1].start_time
// - the first segment starts at 0
// - every segment has a positive duration
// - ids are unique

mod edit;

pub use edit::MIN_FRAGMENT_DURATION;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::analysis::classifier::RawSegment;
pub use crate::analysis::classifier::SegmentType;
use crate::error::SegmentError;

/// Opaque, stable handle of a segment within its list
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SegmentId(u64);

impl SegmentId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for SegmentId {
    fn from(value: u64) -> Self {
        SegmentId(value)
    }
}

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One region of the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(rename = "type")]
    pub segment_type: SegmentType,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub transcription: Option<String>,
    #[serde(default)]
    pub excluded_from_export: bool,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time
    }
}

/// Ordered, contiguous segment arena
///
/// Serializes as `{"segments": [...]}`; deserializing goes through
/// [`SegmentList::restore`] so a persisted list that breaks an invariant is
/// rejected instead of loaded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "PersistedSegments")]
pub struct SegmentList {
    segments: Vec<Segment>,
    #[serde(skip)]
    next_id: u64,
}

#[derive(Deserialize)]
struct PersistedSegments {
    segments: Vec<Segment>,
}

impl TryFrom<PersistedSegments> for SegmentList {
    type Error = SegmentError;

    fn try_from(value: PersistedSegments) -> Result<Self, Self::Error> {
        SegmentList::restore(value.segments)
    }
}

impl SegmentList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from smoothed runs, allocating ids 1, 2, 3, ...
    ///
    /// Runs are expected to be contiguous and to start at 0, as the smoother
    /// produces them.
    pub fn from_raw(raw: &[RawSegment]) -> Self {
        let mut list = Self::new();
        for run in raw {
            let id = list.allocate_id();
            list.segments.push(Segment {
                id,
                start_time: run.start_time,
                end_time: run.end_time,
                segment_type: run.segment_type,
                label: None,
                transcription: None,
                excluded_from_export: false,
            });
        }
        list
    }

    /// Rebuild a list from persisted segments, validating every invariant
    ///
    /// Id allocation continues above the largest restored id.
    pub fn restore(segments: Vec<Segment>) -> Result<Self, SegmentError> {
        if let Some(first) = segments.first() {
            if first.start_time != 0.0 {
                return Err(SegmentError::NotAnchored {
                    start_time: first.start_time,
                });
            }
        }

        let mut seen = HashSet::with_capacity(segments.len());
        for (index, segment) in segments.iter().enumerate() {
            if !(segment.end_time > segment.start_time) {
                return Err(SegmentError::EmptySegment { index });
            }
            if !seen.insert(segment.id) {
                return Err(SegmentError::DuplicateId {
                    id: segment.id.get(),
                });
            }
        }

        for (index, pair) in segments.windows(2).enumerate() {
            if pair[0].end_time != pair[1].start_time {
                return Err(SegmentError::NotContiguous {
                    index,
                    end_time: pair[0].end_time,
                    next_start: pair[1].start_time,
                });
            }
        }

        let next_id = segments.iter().map(|s| s.id.get()).max().unwrap_or(0);
        Ok(Self { segments, next_id })
    }

    pub(crate) fn allocate_id(&mut self) -> SegmentId {
        self.next_id += 1;
        SegmentId(self.next_id)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    /// End of the last segment, 0 for an empty list
    pub fn total_duration(&self) -> f64 {
        self.segments.last().map_or(0.0, |s| s.end_time)
    }

    pub fn get(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    pub fn index_of(&self, id: SegmentId) -> Option<usize> {
        self.segments.iter().position(|s| s.id == id)
    }

    /// Segment under the playhead
    ///
    /// Ranges are half-open except for the very end of the timeline, which
    /// belongs to the last segment.
    pub fn segment_at(&self, time: f64) -> Option<&Segment> {
        let index = self.segments.partition_point(|s| s.end_time <= time);
        match self.segments.get(index) {
            Some(segment) if segment.contains(time) => Some(segment),
            Some(_) => None,
            None => self
                .segments
                .last()
                .filter(|last| time == last.end_time),
        }
    }

    /// Playback range `(start, end)` for looping the given segment
    pub fn loop_range(&self, id: SegmentId) -> Option<(f64, f64)> {
        self.get(id).map(|s| (s.start_time, s.end_time))
    }
}

impl<'a> IntoIterator for &'a SegmentList {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}
