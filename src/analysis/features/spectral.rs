// Spectral module - Frequency-domain feature extraction
//
// This module computes spectral features from magnitude spectra
// (absolute values of FFT bins).

/// Lower edge of the speech band in Hz
const SPEECH_BAND_LOW_HZ: f32 = 300.0;
/// Upper edge of the speech band, start of the high band, in Hz
const SPEECH_BAND_HIGH_HZ: f32 = 4000.0;

/// Spectral feature computation functions
pub struct SpectralFeatures {
    sample_rate: u32,
    fft_size: usize,
}

impl SpectralFeatures {
    pub fn new(sample_rate: u32, fft_size: usize) -> Self {
        Self {
            sample_rate,
            fft_size,
        }
    }

    fn bin_width(&self) -> f32 {
        self.sample_rate as f32 / self.fft_size as f32
    }

    /// Compute spectral centroid (weighted mean frequency)
    ///
    /// Formula: centroid = Σ(f_i × |X[i]|) / Σ|X[i]|
    ///
    /// # Returns
    /// Spectral centroid in Hz, 0 for a (near) silent spectrum
    pub fn compute_centroid(&self, spectrum: &[f32]) -> f32 {
        let freq_bin_width = self.bin_width();

        let weighted_sum: f32 = spectrum
            .iter()
            .enumerate()
            .map(|(i, &mag)| {
                let freq = i as f32 * freq_bin_width;
                freq * mag
            })
            .sum();

        let magnitude_sum: f32 = spectrum.iter().sum();

        if magnitude_sum > 1e-10 {
            weighted_sum / magnitude_sum
        } else {
            0.0
        }
    }

    /// Sum magnitudes in the speech band and above it
    ///
    /// Bin edges are `floor(300 / width)` and `floor(4000 / width)`. When the
    /// 4 kHz bin lies beyond the spectrum (very low sample rates) both bands
    /// report 0.
    ///
    /// # Returns
    /// `(low_band_energy, high_band_energy)`
    pub fn compute_band_energies(&self, spectrum: &[f32]) -> (f32, f32) {
        let width = self.bin_width();
        if width <= 0.0 {
            return (0.0, 0.0);
        }
        let low_bin = (SPEECH_BAND_LOW_HZ / width) as usize;
        let high_bin = (SPEECH_BAND_HIGH_HZ / width) as usize;

        if high_bin >= spectrum.len() {
            return (0.0, 0.0);
        }

        let low: f32 = spectrum[low_bin..high_bin].iter().sum();
        let high: f32 = spectrum[high_bin..].iter().sum();
        (low, high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centroid_of_single_bin() {
        let features = SpectralFeatures::new(8000, 8);
        // bin 2 at 1000 Hz resolution
        let spectrum = [0.0, 0.0, 3.0, 0.0];
        assert!((features.compute_centroid(&spectrum) - 2000.0).abs() < 1e-3);
    }

    #[test]
    fn test_centroid_of_silence_is_zero() {
        let features = SpectralFeatures::new(48000, 16);
        assert_eq!(features.compute_centroid(&[0.0; 8]), 0.0);
    }

    #[test]
    fn test_band_edges() {
        // 100 Hz per bin: low band = bins 3..40, high band = bins 40..
        let features = SpectralFeatures::new(12800, 128);
        let spectrum = vec![1.0; 64];
        let (low, high) = features.compute_band_energies(&spectrum);
        assert_eq!(low, 37.0);
        assert_eq!(high, 24.0);
    }

    #[test]
    fn test_band_energies_zero_when_spectrum_too_narrow() {
        // Nyquist at 2 kHz, the 4 kHz edge is out of range
        let features = SpectralFeatures::new(4000, 64);
        let (low, high) = features.compute_band_energies(&[1.0; 32]);
        assert_eq!((low, high), (0.0, 0.0));
    }
}
