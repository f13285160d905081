//! Configuration management for analysis parameter tuning
//!
//! This module provides runtime configuration loading from JSON files,
//! so thresholds and window sizes can be recalibrated without recompiling.
//! The configuration is always passed explicitly to the pipeline; there is
//! no process-wide instance.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::AnalysisError;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub waveform: WaveformConfig,
    pub features: FeatureConfig,
    pub classifier: ClassifierConfig,
    pub smoothing: SmoothingConfig,
    pub normalization: NormalizationConfig,
}

/// Waveform overview parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformConfig {
    /// Number of (min, max) columns to produce
    pub target_sample_count: usize,
    /// Frames read per chunk by the streaming downsampler
    pub chunk_frames: usize,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            target_sample_count: 1000,
            chunk_frames: 8192,
        }
    }
}

/// Sliding-window feature extraction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// FFT window size in frames (power of two)
    pub window_size: usize,
    /// Advance between consecutive windows in frames
    pub hop_size: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            window_size: 4096,
            hop_size: 2048,
        }
    }
}

/// Rule-based classifier thresholds
///
/// Defaults were calibrated against RMS-normalized rehearsal recordings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Below this RMS a window is silence (about -62 dBFS)
    pub silence_threshold: f32,
    /// Above this RMS a window is performance (about -36 dBFS)
    pub performance_threshold: f32,
    /// Minimum speech-band share of spectral energy for conversation
    pub speech_ratio_threshold: f32,
    /// Conversation requires a centroid below this (Hz)
    pub conversation_centroid_ceiling: f32,
    /// Mid-volume windows brighter than this are performance (Hz)
    pub performance_centroid_floor: f32,
    /// Mid-volume windows noisier than this are performance
    pub performance_zcr_floor: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            silence_threshold: 0.0008,
            performance_threshold: 0.015,
            speech_ratio_threshold: 0.6,
            conversation_centroid_ceiling: 3500.0,
            performance_centroid_floor: 4500.0,
            performance_zcr_floor: 0.25,
        }
    }
}

/// Post-classification smoothing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Segments shorter than this (seconds) are absorbed by a neighbour
    pub min_duration: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { min_duration: 3.0 }
    }
}

/// Loudness normalization targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub target_rms_db: f32,
    pub target_peak_db: f32,
    /// Upper bound on the applied linear gain (1000 = 60 dB)
    pub max_gain: f32,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            target_rms_db: -20.0,
            target_peak_db: -3.0,
            max_gain: 1000.0,
        }
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> AnalysisError {
    AnalysisError::InvalidConfig {
        field: field.to_string(),
        reason: reason.into(),
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.window_size < 2 || !self.window_size.is_power_of_two() {
            return Err(invalid(
                "features.window_size",
                format!("{} is not a power of two >= 2", self.window_size),
            ));
        }
        if self.hop_size == 0 {
            return Err(invalid("features.hop_size", "must be greater than 0"));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Check every section for values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.features.validate()?;

        if self.waveform.chunk_frames == 0 {
            return Err(invalid("waveform.chunk_frames", "must be greater than 0"));
        }

        let c = &self.classifier;
        let thresholds = [
            ("classifier.silence_threshold", c.silence_threshold),
            ("classifier.performance_threshold", c.performance_threshold),
            ("classifier.speech_ratio_threshold", c.speech_ratio_threshold),
            (
                "classifier.conversation_centroid_ceiling",
                c.conversation_centroid_ceiling,
            ),
            (
                "classifier.performance_centroid_floor",
                c.performance_centroid_floor,
            ),
            ("classifier.performance_zcr_floor", c.performance_zcr_floor),
        ];
        for (field, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, format!("{} must be a finite value >= 0", value)));
            }
        }

        if !self.smoothing.min_duration.is_finite() || self.smoothing.min_duration < 0.0 {
            return Err(invalid("smoothing.min_duration", "must be a finite value >= 0"));
        }

        Ok(())
    }

    /// Load configuration from JSON file
    ///
    /// Missing sections or fields take their defaults. A missing or
    /// malformed file yields the default configuration with a warning.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.features.window_size, 4096);
        assert_eq!(config.features.hop_size, 2048);
        assert_eq!(config.classifier.silence_threshold, 0.0008);
        assert_eq!(config.classifier.performance_threshold, 0.015);
        assert_eq!(config.smoothing.min_duration, 3.0);
        assert_eq!(config.waveform.chunk_frames, 8192);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"smoothing": {"min_duration": 5.0}}"#).unwrap();
        assert_eq!(parsed.smoothing.min_duration, 5.0);
        assert_eq!(parsed.features.window_size, 4096);
        assert_eq!(parsed.classifier, ClassifierConfig::default());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/timeline_config.json");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_validate_rejects_non_power_of_two_window() {
        let mut config = AppConfig::default();
        config.features.window_size = 3000;
        match config.validate() {
            Err(AnalysisError::InvalidConfig { field, .. }) => {
                assert_eq!(field, "features.window_size")
            }
            other => panic!("Expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_zero_hop_and_negative_threshold() {
        let mut config = AppConfig::default();
        config.features.hop_size = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.classifier.silence_threshold = -1.0;
        assert!(config.validate().is_err());
    }
}
