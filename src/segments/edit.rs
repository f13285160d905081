// Segment editing operations
//
// Every operation either applies completely or leaves the list untouched and
// returns false. Unknown ids and out-of-range indices/times are routine here
// (a UI selection racing a re-analysis), so they are rejections, not errors.

use super::{Segment, SegmentId, SegmentList, SegmentType};

/// Shortest segment an edit may create, in seconds
pub const MIN_FRAGMENT_DURATION: f64 = 0.1;

impl SegmentList {
    fn find_mut(&mut self, id: SegmentId) -> Option<&mut Segment> {
        self.segments.iter_mut().find(|s| s.id == id)
    }

    pub fn update_type(&mut self, id: SegmentId, segment_type: SegmentType) -> bool {
        match self.find_mut(id) {
            Some(segment) => {
                segment.segment_type = segment_type;
                true
            }
            None => false,
        }
    }

    /// Set the label; an empty string clears it
    pub fn update_label(&mut self, id: SegmentId, label: &str) -> bool {
        match self.find_mut(id) {
            Some(segment) => {
                segment.label = if label.is_empty() {
                    None
                } else {
                    Some(label.to_string())
                };
                true
            }
            None => false,
        }
    }

    pub fn update_transcription(&mut self, id: SegmentId, transcription: Option<String>) -> bool {
        match self.find_mut(id) {
            Some(segment) => {
                segment.transcription = transcription;
                true
            }
            None => false,
        }
    }

    pub fn update_export_exclusion(&mut self, id: SegmentId, excluded: bool) -> bool {
        match self.find_mut(id) {
            Some(segment) => {
                segment.excluded_from_export = excluded;
                true
            }
            None => false,
        }
    }

    /// Move the boundary between segment `index` and `index + 1`
    ///
    /// `new_time` is clamped so neither neighbour of the boundary drops below
    /// [`MIN_FRAGMENT_DURATION`]. When no such position exists the list is
    /// left as is.
    pub fn move_boundary(&mut self, index: usize, new_time: f64) -> bool {
        if index + 1 >= self.segments.len() || new_time.is_nan() {
            return false;
        }

        let min_time = if index > 0 {
            self.segments[index - 1].end_time + MIN_FRAGMENT_DURATION
        } else {
            MIN_FRAGMENT_DURATION
        };
        let max_time = self.segments[index + 1].end_time - MIN_FRAGMENT_DURATION;
        if min_time > max_time {
            return false;
        }

        let clamped = new_time.clamp(min_time, max_time);
        self.segments[index].end_time = clamped;
        self.segments[index + 1].start_time = clamped;
        true
    }

    /// Split the segment strictly containing `at_time` into two
    ///
    /// Both halves keep the type and export flag and get fresh ids. Label and
    /// transcription belong to the old range and are dropped. Rejected when
    /// either half would be [`MIN_FRAGMENT_DURATION`] or shorter.
    pub fn split_segment(&mut self, at_time: f64) -> bool {
        let Some(index) = self
            .segments
            .iter()
            .position(|s| at_time > s.start_time && at_time < s.end_time)
        else {
            return false;
        };

        let original = &self.segments[index];
        if at_time - original.start_time <= MIN_FRAGMENT_DURATION
            || original.end_time - at_time <= MIN_FRAGMENT_DURATION
        {
            return false;
        }

        let (start_time, end_time) = (original.start_time, original.end_time);
        let segment_type = original.segment_type;
        let excluded_from_export = original.excluded_from_export;

        let left = Segment {
            id: self.allocate_id(),
            start_time,
            end_time: at_time,
            segment_type,
            label: None,
            transcription: None,
            excluded_from_export,
        };
        let right = Segment {
            id: self.allocate_id(),
            start_time: at_time,
            end_time,
            segment_type,
            label: None,
            transcription: None,
            excluded_from_export,
        };

        self.segments.splice(index..=index, [left, right]);
        true
    }

    /// Merge a segment with its successor
    ///
    /// The result keeps the first segment's id, start, type and export flag
    /// and ends where the successor ended. The first label wins; both
    /// transcriptions are kept, joined by a newline.
    pub fn merge_with_next(&mut self, id: SegmentId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if index + 1 >= self.segments.len() {
            return false;
        }

        let next = self.segments.remove(index + 1);
        let current = &mut self.segments[index];

        current.end_time = next.end_time;
        if current.label.is_none() {
            current.label = next.label;
        }
        current.transcription = match (current.transcription.take(), next.transcription) {
            (Some(first), Some(second)) => Some(format!("{}\n{}", first, second)),
            (first, second) => first.or(second),
        };
        true
    }
}
