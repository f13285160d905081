// Classifier - rule-based timeline region classification
//
// Each feature point is mapped to Silence, Performance or Conversation with
// a fixed, ordered set of threshold rules. Consecutive points with the same
// decision are run-length encoded into raw segments, which the smoother then
// cleans up.
//
// Decision order:
// 1. quiet windows are silence
// 2. loud windows are performance
// 3. mid-volume windows are split on speech-band ratio, centroid and ZCR

use serde::{Deserialize, Serialize};

use super::features::FeaturePoint;
use crate::config::ClassifierConfig;

/// Guards the speech ratio against an all-zero spectrum
const SPEECH_RATIO_EPSILON: f32 = 1e-6;

/// SegmentType is the semantic label of a timeline region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentType {
    /// Music being played (loud, or bright/noisy mid-volume content)
    Performance,
    /// Talking between takes (mid-volume, speech-band dominated)
    Conversation,
    /// Nothing above the noise floor
    Silence,
}

impl SegmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentType::Performance => "performance",
            SegmentType::Conversation => "conversation",
            SegmentType::Silence => "silence",
        }
    }
}

impl std::fmt::Display for SegmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A same-label run of feature points, before smoothing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSegment {
    pub start_time: f64,
    pub end_time: f64,
    pub segment_type: SegmentType,
}

impl RawSegment {
    pub fn new(start_time: f64, end_time: f64, segment_type: SegmentType) -> Self {
        Self {
            start_time,
            end_time,
            segment_type,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Classifier applies the threshold rules to feature points
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Decide the label of a single feature point
    ///
    /// Rules are evaluated in order; the first match wins:
    /// 1. rms < silence_threshold -> Silence
    /// 2. rms > performance_threshold -> Performance
    /// 3. speech ratio > speech_ratio_threshold AND centroid < conversation ceiling -> Conversation
    /// 4. centroid > performance floor OR zcr > zcr floor -> Performance
    /// 5. otherwise Conversation
    pub fn classify_point(&self, point: &FeaturePoint) -> SegmentType {
        let cfg = &self.config;

        if point.rms < cfg.silence_threshold {
            return SegmentType::Silence;
        }
        if point.rms > cfg.performance_threshold {
            return SegmentType::Performance;
        }

        let speech_ratio = point.low_band_energy
            / (point.low_band_energy + point.high_band_energy + SPEECH_RATIO_EPSILON);

        if speech_ratio > cfg.speech_ratio_threshold
            && point.spectral_centroid < cfg.conversation_centroid_ceiling
        {
            SegmentType::Conversation
        } else if point.spectral_centroid > cfg.performance_centroid_floor
            || point.zero_crossing_rate > cfg.performance_zcr_floor
        {
            SegmentType::Performance
        } else {
            SegmentType::Conversation
        }
    }

    /// Run-length encode the decisions for a feature sequence
    ///
    /// The last run is closed at the final point's time.
    pub fn classify(&self, features: &[FeaturePoint]) -> Vec<RawSegment> {
        match features.last() {
            Some(last) => self.classify_until(features, last.time),
            None => Vec::new(),
        }
    }

    /// Like [`Classifier::classify`], but closes the last run at `end_time`
    ///
    /// The first run always opens at 0 and takes the first point's decision.
    ///
    /// Used with the source duration so the runs cover the whole recording,
    /// not just up to the last window start. `end_time` earlier than the
    /// final point is ignored.
    pub fn classify_until(&self, features: &[FeaturePoint], end_time: f64) -> Vec<RawSegment> {
        let Some(first) = features.first() else {
            return Vec::new();
        };

        // The opening run is anchored at 0 even when the first window starts later
        let mut segments = Vec::new();
        let mut run_type = self.classify_point(first);
        let mut run_start = 0.0;

        for point in &features[1..] {
            let decided = self.classify_point(point);
            if decided != run_type {
                if point.time > run_start {
                    segments.push(RawSegment::new(run_start, point.time, run_type));
                }
                run_type = decided;
                run_start = point.time;
            }
        }

        let last_time = features.last().map_or(first.time, |p| p.time);
        let close = end_time.max(last_time);
        if close > run_start {
            segments.push(RawSegment::new(run_start, close, run_type));
        }

        log::debug!(
            "Classified {} feature points into {} raw runs",
            features.len(),
            segments.len()
        );
        segments
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
