// FeatureExtractor - sliding-window DSP features for timeline classification
//
// This module slides a fixed-size window with a fixed hop over the recording
// and computes one `FeaturePoint` per position. Only channel 0 is analysed.
//
// Module organization:
// - types: Data structures (FeaturePoint)
// - fft: FFT computation with Hann windowing
// - spectral: Frequency-domain features (centroid, speech/high band energy)
// - temporal: Time-domain features (RMS, ZCR)
// - mod.rs: Coordinator (FeatureExtractor, FeatureStream)
//
// Windows are placed at 0, hop, 2*hop, ... while a full window still fits;
// the trailing partial window is discarded.

mod fft;
mod spectral;
pub mod temporal;
mod types;

pub use types::FeaturePoint;

use fft::FftProcessor;
use spectral::SpectralFeatures;

use super::cancel::CancellationToken;
use crate::audio::PcmSource;
use crate::config::FeatureConfig;
use crate::error::AnalysisError;

/// FeatureExtractor coordinates the per-window DSP computation
///
/// Owns the FFT plan and scratch buffers, so one extractor is created per
/// pipeline run and fed windows sequentially.
pub struct FeatureExtractor {
    fft_processor: FftProcessor,
    spectral_features: SpectralFeatures,
    spectrum: Vec<f32>,
    sample_rate: u32,
    window_size: usize,
    hop_size: usize,
}

impl FeatureExtractor {
    /// Create a new FeatureExtractor
    ///
    /// # Errors
    /// `InvalidConfig` for a zero hop, `FftSetup` when the window size
    /// cannot be planned
    pub fn new(sample_rate: u32, config: &FeatureConfig) -> Result<Self, AnalysisError> {
        if config.hop_size == 0 {
            return Err(AnalysisError::InvalidConfig {
                field: "features.hop_size".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        let fft_processor = FftProcessor::new(config.window_size)?;

        Ok(Self {
            fft_processor,
            spectral_features: SpectralFeatures::new(sample_rate, config.window_size),
            spectrum: Vec::with_capacity(config.window_size / 2),
            sample_rate,
            window_size: config.window_size,
            hop_size: config.hop_size,
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Extract all features from one mono window
    ///
    /// 1. RMS and ZCR on the raw samples
    /// 2. Hann-windowed magnitude spectrum
    /// 3. Centroid and band energies from the spectrum
    ///
    /// # Arguments
    /// * `window` - Mono samples (zero padded if shorter than the window size)
    /// * `time` - Window start in seconds
    pub fn extract(&mut self, window: &[f32], time: f64) -> FeaturePoint {
        let window = &window[..window.len().min(self.window_size)];

        let rms = temporal::compute_rms(window);
        let zero_crossing_rate = temporal::compute_zcr(window);

        self.fft_processor
            .compute_magnitude_spectrum(window, &mut self.spectrum);
        let spectral_centroid = self.spectral_features.compute_centroid(&self.spectrum);
        let (low_band_energy, high_band_energy) =
            self.spectral_features.compute_band_energies(&self.spectrum);

        FeaturePoint {
            time,
            rms,
            low_band_energy,
            high_band_energy,
            spectral_centroid,
            zero_crossing_rate,
        }
    }

    /// Extract every window of an interleaved in-memory buffer
    pub fn extract_buffer(&mut self, samples: &[f32], channels: usize) -> Vec<FeaturePoint> {
        if channels == 0 || self.sample_rate == 0 {
            return Vec::new();
        }
        let total_frames = samples.len() / channels;
        let mut points = Vec::new();
        let mut mono = Vec::with_capacity(self.window_size);
        let mut start = 0usize;

        while start + self.window_size <= total_frames {
            mono.clear();
            mono.extend(
                samples[start * channels..(start + self.window_size) * channels]
                    .iter()
                    .step_by(channels),
            );
            let time = start as f64 / self.sample_rate as f64;
            points.push(self.extract(&mono, time));
            start += self.hop_size;
        }
        points
    }

    /// Stream feature points from a source, one window at a time
    pub fn stream<'a>(
        self,
        source: &'a dyn PcmSource,
        cancel: &'a CancellationToken,
    ) -> FeatureStream<'a> {
        FeatureStream::new(self, source, cancel)
    }
}

/// Iterator of feature points read incrementally from a `PcmSource`
///
/// Only channel-0 samples of the current window (plus at most one read chunk)
/// are held in memory. The stream ends early, without an error, when the
/// cancellation token fires; callers check the token to tell a cancelled
/// stream from a finished one.
pub struct FeatureStream<'a> {
    extractor: FeatureExtractor,
    source: &'a dyn PcmSource,
    cancel: &'a CancellationToken,
    channels: usize,
    total_frames: u64,
    /// Start frame of the next window
    position: u64,
    /// Channel-0 samples beginning at `pending_start`
    pending: Vec<f32>,
    pending_start: u64,
    read_cursor: u64,
    chunk: Vec<f32>,
    finished: bool,
}

impl<'a> FeatureStream<'a> {
    fn new(
        extractor: FeatureExtractor,
        source: &'a dyn PcmSource,
        cancel: &'a CancellationToken,
    ) -> Self {
        let window_size = extractor.window_size;
        Self {
            extractor,
            source,
            cancel,
            channels: source.channel_count(),
            total_frames: source.total_frames(),
            position: 0,
            pending: Vec::with_capacity(window_size * 2),
            pending_start: 0,
            read_cursor: 0,
            chunk: Vec::new(),
            finished: false,
        }
    }

    fn finish<T>(&mut self) -> Option<T> {
        self.finished = true;
        None
    }
}

impl Iterator for FeatureStream<'_> {
    type Item = Result<FeaturePoint, AnalysisError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.cancel.is_cancelled() {
            tracing::debug!(position = self.position, "feature extraction cancelled");
            return self.finish();
        }

        let window_size = self.extractor.window_size;
        let sample_rate = self.extractor.sample_rate;
        if self.channels == 0
            || sample_rate == 0
            || self.position + window_size as u64 > self.total_frames
        {
            return self.finish();
        }

        // Drop samples that precede the current window
        if self.position > self.pending_start {
            let skip = ((self.position - self.pending_start) as usize).min(self.pending.len());
            self.pending.drain(..skip);
            self.pending_start = self.position;
            self.read_cursor = self.read_cursor.max(self.position);
        }

        while self.pending.len() < window_size {
            match self
                .source
                .read_frames(self.read_cursor, window_size, &mut self.chunk)
            {
                Ok(0) => return self.finish(),
                Ok(read) => {
                    self.pending.extend(
                        self.chunk[..read * self.channels]
                            .iter()
                            .step_by(self.channels),
                    );
                    self.read_cursor += read as u64;
                }
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }

        let time = self.position as f64 / sample_rate as f64;
        let point = self.extractor.extract(&self.pending[..window_size], time);
        self.position += self.extractor.hop_size as u64;
        Some(Ok(point))
    }
}

/// Run the extractor over a whole source
///
/// Returns the points gathered before cancellation if the token fires; the
/// caller decides whether that counts as superseded.
pub fn extract_features(
    source: &dyn PcmSource,
    config: &FeatureConfig,
    cancel: &CancellationToken,
) -> Result<Vec<FeaturePoint>, AnalysisError> {
    if source.total_frames() == 0 || source.channel_count() == 0 {
        return Ok(Vec::new());
    }
    let extractor = FeatureExtractor::new(source.sample_rate(), config)?;
    tracing::debug!(
        window_size = config.window_size,
        hop_size = config.hop_size,
        total_frames = source.total_frames(),
        "feature extraction started"
    );
    let points = extractor
        .stream(source, cancel)
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(points = points.len(), "feature extraction finished");
    Ok(points)
}
