// Audio module - PCM sources and loudness normalization
//
// The analysis pipeline never touches files or decoders directly. It reads
// interleaved f32 frames through the `PcmSource` trait, so in-memory buffers,
// WAV files on disk and normalized copies are interchangeable.

pub mod memory;
pub mod normalize;
pub mod wav;

pub use memory::MemorySource;
pub use normalize::{normalize_peak, normalize_rms};
pub use wav::WavSource;

use crate::error::AnalysisError;

/// Random-access source of interleaved PCM frames
///
/// A frame holds one sample per channel. Samples are f32, nominally in
/// [-1.0, 1.0].
pub trait PcmSource: Send + Sync {
    fn sample_rate(&self) -> u32;

    fn channel_count(&self) -> usize;

    fn total_frames(&self) -> u64;

    /// Read up to `frame_count` frames starting at `start_frame`
    ///
    /// `buffer` is cleared and refilled with interleaved samples. Returns the
    /// number of whole frames read, which is short (possibly 0) at the end of
    /// the stream.
    fn read_frames(
        &self,
        start_frame: u64,
        frame_count: usize,
        buffer: &mut Vec<f32>,
    ) -> Result<usize, AnalysisError>;

    /// Length of the recording in seconds (0 for an empty or rate-less source)
    fn duration_secs(&self) -> f64 {
        let rate = self.sample_rate();
        if rate == 0 {
            0.0
        } else {
            self.total_frames() as f64 / rate as f64
        }
    }
}
