// Temporal module - Time-domain feature extraction
//
// Loudness and zero-crossing features computed directly on the raw window,
// before any windowing function is applied.

/// Compute root-mean-square amplitude
///
/// Accumulates in f64 so long windows do not lose precision.
pub fn compute_rms(audio: &[f32]) -> f32 {
    if audio.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = audio.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / audio.len() as f64).sqrt() as f32
}

/// Compute zero-crossing rate (ZCR)
///
/// Counts sign changes between adjacent samples (a sample >= 0 counts as
/// non-negative) and divides by the number of adjacent pairs.
///
/// # Returns
/// Zero-crossing rate (0.0 to 1.0)
pub fn compute_zcr(audio: &[f32]) -> f32 {
    if audio.len() < 2 {
        return 0.0;
    }

    let crossings = audio
        .windows(2)
        .filter(|pair| (pair[0] < 0.0) != (pair[1] < 0.0))
        .count();

    crossings as f32 / (audio.len() - 1) as f32
}
