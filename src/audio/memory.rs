// MemorySource - interleaved PCM held entirely in memory

use super::PcmSource;
use crate::error::AnalysisError;

/// PCM source backed by an interleaved sample vector
///
/// Used for decoded recordings that fit in memory, for the output of
/// normalization, and for synthetic test signals.
#[derive(Debug, Clone)]
pub struct MemorySource {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

impl MemorySource {
    /// Wrap interleaved samples
    ///
    /// A trailing partial frame (when `samples.len()` is not a multiple of
    /// `channels`) is dropped.
    pub fn new(mut samples: Vec<f32>, channels: usize, sample_rate: u32) -> Self {
        if channels == 0 {
            samples.clear();
        } else {
            let whole = samples.len() - samples.len() % channels;
            samples.truncate(whole);
        }
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples, 1, sample_rate)
    }

    /// Read every frame of `source` into memory
    pub fn from_source(source: &dyn PcmSource) -> Result<Self, AnalysisError> {
        let channels = source.channel_count();
        let total = source.total_frames();
        let mut samples = Vec::with_capacity(total as usize * channels);
        let mut chunk = Vec::new();
        let mut position = 0u64;
        while position < total {
            let wanted = (total - position).min(65_536) as usize;
            let read = source.read_frames(position, wanted, &mut chunk)?;
            if read == 0 {
                break;
            }
            samples.extend_from_slice(&chunk[..read * channels]);
            position += read as u64;
        }
        Ok(Self::new(samples, channels, source.sample_rate()))
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

impl PcmSource for MemorySource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channel_count(&self) -> usize {
        self.channels
    }

    fn total_frames(&self) -> u64 {
        if self.channels == 0 {
            0
        } else {
            (self.samples.len() / self.channels) as u64
        }
    }

    fn read_frames(
        &self,
        start_frame: u64,
        frame_count: usize,
        buffer: &mut Vec<f32>,
    ) -> Result<usize, AnalysisError> {
        buffer.clear();
        let total = self.total_frames();
        if start_frame >= total {
            return Ok(0);
        }
        let end = (start_frame + frame_count as u64).min(total);
        let from = start_frame as usize * self.channels;
        let to = end as usize * self.channels;
        buffer.extend_from_slice(&self.samples[from..to]);
        Ok((end - start_frame) as usize)
    }
}
