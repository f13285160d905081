// Waveform downsampler - (min, max) overview columns for rendering
//
// The frame range is split into `target` buckets of
// `samples_per_pixel = max(1, total_frames / target)` frames. Each bucket
// reports the extrema across every channel; channels are not averaged, so a
// transient on any channel shows up in the overview. Frames past
// `target * samples_per_pixel` fall outside the last bucket and are ignored.

use serde::{Deserialize, Serialize};

use super::cancel::CancellationToken;
use crate::audio::PcmSource;
use crate::error::AnalysisError;

/// One visual column of the waveform overview
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveformSample {
    pub min: f32,
    pub max: f32,
}

/// Bucket state carried across chunk boundaries
struct BucketAccumulator {
    samples_per_pixel: u64,
    target: usize,
    in_bucket: u64,
    cur_min: f32,
    cur_max: f32,
    out: Vec<WaveformSample>,
}

impl BucketAccumulator {
    fn new(total_frames: u64, target: usize) -> Self {
        Self {
            samples_per_pixel: (total_frames / target as u64).max(1),
            target,
            in_bucket: 0,
            cur_min: f32::INFINITY,
            cur_max: f32::NEG_INFINITY,
            out: Vec::with_capacity(target),
        }
    }

    fn is_full(&self) -> bool {
        self.out.len() >= self.target
    }

    /// Feed interleaved frames; returns false once every bucket is filled
    fn push_frames(&mut self, interleaved: &[f32], channels: usize) -> bool {
        for frame in interleaved.chunks_exact(channels) {
            if self.is_full() {
                return false;
            }
            for &sample in frame {
                if sample < self.cur_min {
                    self.cur_min = sample;
                }
                if sample > self.cur_max {
                    self.cur_max = sample;
                }
            }
            self.in_bucket += 1;
            if self.in_bucket == self.samples_per_pixel {
                self.flush();
            }
        }
        !self.is_full()
    }

    fn flush(&mut self) {
        if self.in_bucket > 0 && !self.is_full() {
            // NaN never widens the range; a bucket of only NaN is flat
            let column = if self.cur_min <= self.cur_max {
                WaveformSample {
                    min: self.cur_min,
                    max: self.cur_max,
                }
            } else {
                WaveformSample { min: 0.0, max: 0.0 }
            };
            self.out.push(column);
        }
        self.in_bucket = 0;
        self.cur_min = f32::INFINITY;
        self.cur_max = f32::NEG_INFINITY;
    }

    fn finish(mut self) -> Vec<WaveformSample> {
        self.flush();
        self.out
    }
}

/// Downsample an interleaved in-memory buffer
pub fn downsample_buffer(samples: &[f32], channels: usize, target: usize) -> Vec<WaveformSample> {
    if channels == 0 || target == 0 {
        return Vec::new();
    }
    let total_frames = (samples.len() / channels) as u64;
    if total_frames == 0 {
        return Vec::new();
    }

    let mut acc = BucketAccumulator::new(total_frames, target);
    acc.push_frames(samples, channels);
    acc.finish()
}

/// Downsample a source chunk by chunk without loading it into memory
///
/// Stops early (with the buckets filled so far) when `cancel` fires; the
/// caller is expected to check the token and discard the partial result.
pub fn downsample_source(
    source: &dyn PcmSource,
    target: usize,
    chunk_frames: usize,
    cancel: &CancellationToken,
) -> Result<Vec<WaveformSample>, AnalysisError> {
    let channels = source.channel_count();
    let total_frames = source.total_frames();
    if channels == 0 || target == 0 || total_frames == 0 {
        return Ok(Vec::new());
    }

    tracing::debug!(total_frames, channels, target, "waveform downsampling started");

    let mut acc = BucketAccumulator::new(total_frames, target);
    let mut chunk = Vec::with_capacity(chunk_frames.max(1) * channels);
    let mut position = 0u64;

    while position < total_frames {
        if cancel.is_cancelled() {
            tracing::debug!(position, "waveform downsampling cancelled");
            break;
        }
        let read = source.read_frames(position, chunk_frames.max(1), &mut chunk)?;
        if read == 0 {
            break;
        }
        position += read as u64;
        if !acc.push_frames(&chunk[..read * channels], channels) {
            break;
        }
    }

    let samples = acc.finish();
    tracing::debug!(columns = samples.len(), "waveform downsampling finished");
    Ok(samples)
}
