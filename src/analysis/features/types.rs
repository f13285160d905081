// Types module - Data structures for per-window audio features

use serde::{Deserialize, Serialize};

/// Features extracted from one analysis window
///
/// These drive the silence / performance / conversation decision. One point
/// is produced per hop position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeaturePoint {
    /// Start of the window in the source, in seconds
    pub time: f64,

    /// Root-mean-square amplitude of the raw window (loudness proxy)
    pub rms: f32,

    /// Summed FFT magnitude between 300 Hz and 4 kHz (approximate speech band)
    pub low_band_energy: f32,

    /// Summed FFT magnitude above 4 kHz
    pub high_band_energy: f32,

    /// Spectral centroid in Hz (weighted mean frequency)
    ///
    /// Measures the "brightness" of the sound.
    pub spectral_centroid: f32,

    /// Zero-crossing rate (0.0 to 1.0, normalized)
    ///
    /// High for noisy, percussive or fricative content.
    pub zero_crossing_rate: f32,
}
