// Smoother - minimum-duration enforcement for raw classifier runs
//
// A single left-to-right pass with one accumulator. Short runs are folded
// into a neighbour and contiguous same-type runs are coalesced, so the output
// only contains runs of at least `min_duration` with differing adjacent types.
// The one exception is a recording shorter than the minimum, which comes out
// as a single short run.

use super::classifier::RawSegment;

pub struct Smoother {
    min_duration: f64,
}

impl Smoother {
    pub fn new(min_duration: f64) -> Self {
        Self { min_duration }
    }

    pub fn min_duration(&self) -> f64 {
        self.min_duration
    }

    /// Merge short runs into their neighbours
    ///
    /// For each run after the first, against the accumulated `current`:
    /// 1. `next` shorter than the minimum: `current` swallows it and keeps its type
    /// 2. `current` shorter than the minimum: `next` swallows it, taking
    ///    `current`'s start
    /// 3. same type: coalesce
    /// 4. otherwise commit `current` and continue from `next`
    ///
    /// Rule 1 is checked before rule 2, so a short run between two longer
    /// runs of different types always goes to its predecessor. This can
    /// label a short run after whichever neighbour comes first in time; it
    /// is a known approximation and scanning in the other direction would
    /// give different results.
    pub fn smooth(&self, raw: &[RawSegment]) -> Vec<RawSegment> {
        let Some((&first, rest)) = raw.split_first() else {
            return Vec::new();
        };

        let mut output = Vec::new();
        let mut current = first;

        for &next in rest {
            if next.duration() < self.min_duration {
                current.end_time = next.end_time;
            } else if current.duration() < self.min_duration {
                current = RawSegment::new(current.start_time, next.end_time, next.segment_type);
            } else if current.segment_type == next.segment_type {
                current.end_time = next.end_time;
            } else {
                output.push(current);
                current = next;
            }
        }
        output.push(current);

        log::debug!(
            "Smoothed {} raw runs into {} segments (min duration {:.2}s)",
            raw.len(),
            output.len(),
            self.min_duration
        );
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classifier::SegmentType;
    use crate::analysis::classifier::SegmentType::{Conversation, Performance, Silence};

    fn seg(start: f64, end: f64, t: SegmentType) -> RawSegment {
        RawSegment::new(start, end, t)
    }

    #[test]
    fn test_empty_input() {
        assert!(Smoother::new(3.0).smooth(&[]).is_empty());
    }

    #[test]
    fn test_short_next_absorbed_backward() {
        let smoother = Smoother::new(3.0);
        let out = smoother.smooth(&[
            seg(0.0, 5.0, Performance),
            seg(5.0, 6.0, Silence),
            seg(6.0, 12.0, Performance),
        ]);
        assert_eq!(out, vec![seg(0.0, 12.0, Performance)]);
    }

    #[test]
    fn test_short_current_absorbed_forward() {
        let smoother = Smoother::new(3.0);
        let out = smoother.smooth(&[seg(0.0, 1.0, Silence), seg(1.0, 8.0, Conversation)]);
        assert_eq!(out, vec![seg(0.0, 8.0, Conversation)]);
    }

    #[test]
    fn test_short_between_different_types_goes_to_predecessor() {
        let smoother = Smoother::new(3.0);
        let out = smoother.smooth(&[
            seg(0.0, 4.0, Performance),
            seg(4.0, 5.0, Silence),
            seg(5.0, 10.0, Conversation),
        ]);
        assert_eq!(
            out,
            vec![seg(0.0, 5.0, Performance), seg(5.0, 10.0, Conversation)]
        );
    }

    #[test]
    fn test_long_runs_of_different_type_are_kept() {
        let smoother = Smoother::new(3.0);
        let raw = vec![
            seg(0.0, 4.1, Silence),
            seg(4.1, 8.1, Performance),
            seg(8.1, 12.0, Conversation),
        ];
        assert_eq!(smoother.smooth(&raw), raw);
    }

    #[test]
    fn test_short_final_run_is_kept_when_alone() {
        let smoother = Smoother::new(3.0);
        let out = smoother.smooth(&[seg(0.0, 1.0, Silence)]);
        assert_eq!(out, vec![seg(0.0, 1.0, Silence)]);
    }

    #[test]
    fn test_output_is_fixed_point() {
        let smoother = Smoother::new(3.0);
        let raw = vec![
            seg(0.0, 0.5, Silence),
            seg(0.5, 2.0, Performance),
            seg(2.0, 6.0, Conversation),
            seg(6.0, 6.5, Performance),
            seg(6.5, 7.0, Silence),
            seg(7.0, 11.0, Conversation),
            seg(11.0, 16.0, Performance),
            seg(16.0, 17.0, Silence),
        ];
        let once = smoother.smooth(&raw);
        let twice = smoother.smooth(&once);
        assert_eq!(once, twice);

        // Contiguous and covering the input range
        assert_eq!(once.first().unwrap().start_time, 0.0);
        assert_eq!(once.last().unwrap().end_time, 17.0);
        for pair in once.windows(2) {
            assert_eq!(pair[0].end_time, pair[1].start_time);
            assert_ne!(pair[0].segment_type, pair[1].segment_type);
        }
    }
}
