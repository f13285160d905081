// Loudness normalization
//
// Normalization produces a new in-memory source; it never edits the original.
// Any analysis derived from the old source is invalid afterwards and the
// caller must re-run the pipeline (see `Session::normalize_and_reanalyze`).

use super::{MemorySource, PcmSource};
use crate::error::AnalysisError;

/// Sources quieter than this are returned unchanged
const SILENCE_FLOOR: f32 = 0.000_001;

fn db_to_linear(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Peak normalization: scale so the loudest sample on any channel hits `target_db`
pub fn normalize_peak(source: &dyn PcmSource, target_db: f32) -> Result<MemorySource, AnalysisError> {
    let memory = MemorySource::from_source(source)?;
    let peak = memory
        .samples()
        .iter()
        .fold(0.0f32, |acc, &s| acc.max(s.abs()));

    if peak < SILENCE_FLOOR {
        return Ok(memory);
    }

    let gain = db_to_linear(target_db) / peak;
    tracing::info!(peak, target_db, gain, "peak normalization");
    Ok(apply_gain(&memory, gain))
}

/// RMS normalization toward `target_db` dBFS
///
/// The measured level is the mean of the per-channel RMS values. The gain is
/// capped at `max_gain` so near-silent takes are not blown up into noise.
pub fn normalize_rms(
    source: &dyn PcmSource,
    target_db: f32,
    max_gain: f32,
) -> Result<MemorySource, AnalysisError> {
    let memory = MemorySource::from_source(source)?;
    let channels = memory.channel_count();
    let frames = memory.total_frames() as usize;
    if channels == 0 || frames == 0 {
        return Ok(memory);
    }

    let mut sum_sq = vec![0.0f64; channels];
    for frame in memory.samples().chunks_exact(channels) {
        for (c, &s) in frame.iter().enumerate() {
            sum_sq[c] += (s as f64) * (s as f64);
        }
    }
    let average_rms = sum_sq
        .iter()
        .map(|&sq| (sq / frames as f64).sqrt())
        .sum::<f64>() as f32
        / channels as f32;

    if average_rms < SILENCE_FLOOR {
        return Ok(memory);
    }

    let gain = (db_to_linear(target_db) / average_rms).min(max_gain);
    tracing::info!(
        current_db = 20.0 * average_rms.log10(),
        target_db,
        gain_db = 20.0 * gain.log10(),
        "RMS normalization"
    );
    Ok(apply_gain(&memory, gain))
}

fn apply_gain(source: &MemorySource, gain: f32) -> MemorySource {
    let samples = source.samples().iter().map(|&s| s * gain).collect();
    MemorySource::new(samples, source.channel_count(), source.sample_rate())
}
