// FFT module - Fast Fourier Transform computation
//
// This module handles FFT computation with Hann windowing to reduce
// spectral leakage. The magnitude spectrum is used by spectral feature
// extraction functions.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::error::AnalysisError;

/// FFT processor that computes magnitude spectra from audio windows
///
/// The plan, the Hann window and the working buffers are created once and
/// reused for every window of a run.
pub struct FftProcessor {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    /// Hann window for FFT (pre-computed)
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl FftProcessor {
    /// Create a new FFT processor
    ///
    /// # Arguments
    /// * `fft_size` - FFT window size (power of two, typically 4096)
    ///
    /// # Errors
    /// `AnalysisError::FftSetup` when the size cannot be planned
    pub fn new(fft_size: usize) -> Result<Self, AnalysisError> {
        if fft_size < 2 || !fft_size.is_power_of_two() {
            return Err(AnalysisError::FftSetup {
                window_size: fft_size,
                reason: "window size must be a power of two >= 2".to_string(),
            });
        }

        let window = (0..fft_size)
            .map(|i| {
                0.5 * (1.0
                    - ((2.0 * std::f32::consts::PI * i as f32) / (fft_size as f32 - 1.0)).cos())
            })
            .collect();

        let fft = FftPlanner::new().plan_fft_forward(fft_size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Ok(Self {
            fft,
            fft_size,
            window,
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch,
        })
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Compute magnitude spectrum using FFT
    ///
    /// Applies Hann windowing, performs the FFT and writes `fft_size / 2`
    /// magnitudes (DC up to, excluding, Nyquist) into `spectrum`. Input
    /// shorter than the window is zero padded.
    pub fn compute_magnitude_spectrum(&mut self, audio: &[f32], spectrum: &mut Vec<f32>) {
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = audio.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        spectrum.clear();
        spectrum.extend(self.buffer[..self.fft_size / 2].iter().map(|c| c.norm()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_power_of_two() {
        assert!(matches!(
            FftProcessor::new(1000),
            Err(AnalysisError::FftSetup { window_size: 1000, .. })
        ));
        assert!(FftProcessor::new(0).is_err());
    }

    #[test]
    fn test_spectrum_length_and_peak_bin() {
        let size = 1024;
        let sample_rate = 8192.0;
        let mut fft = FftProcessor::new(size).unwrap();
        // 512 Hz lands exactly on bin 64 at 8 Hz resolution
        let signal: Vec<f32> = (0..size)
            .map(|i| (2.0 * std::f32::consts::PI * 512.0 * i as f32 / sample_rate).sin())
            .collect();
        let mut spectrum = Vec::new();
        fft.compute_magnitude_spectrum(&signal, &mut spectrum);

        assert_eq!(spectrum.len(), size / 2);
        let (peak, _) = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        assert_eq!(peak, 64);
    }
}
