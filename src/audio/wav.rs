// WavSource - random-access frame reader over a WAV file
//
// Only the requested frame range is decoded on each read, so recordings far
// larger than memory can be downsampled and analysed in a single pass.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Mutex;

use super::PcmSource;
use crate::error::AnalysisError;

pub struct WavSource {
    reader: Mutex<hound::WavReader<BufReader<File>>>,
    spec: hound::WavSpec,
    total_frames: u64,
}

impl WavSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let reader = hound::WavReader::open(path.as_ref())?;
        let spec = reader.spec();

        match (spec.sample_format, spec.bits_per_sample) {
            (hound::SampleFormat::Float, 32) => {}
            (hound::SampleFormat::Int, 8 | 16 | 24 | 32) => {}
            (format, bits) => {
                return Err(AnalysisError::UnsupportedFormat {
                    details: format!("{:?} with {} bits per sample", format, bits),
                })
            }
        }

        let total_frames = reader.duration() as u64;
        tracing::debug!(
            path = %path.as_ref().display(),
            sample_rate = spec.sample_rate,
            channels = spec.channels,
            total_frames,
            "opened WAV source"
        );

        Ok(Self {
            reader: Mutex::new(reader),
            spec,
            total_frames,
        })
    }
}

impl PcmSource for WavSource {
    fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }

    fn channel_count(&self) -> usize {
        self.spec.channels as usize
    }

    fn total_frames(&self) -> u64 {
        self.total_frames
    }

    fn read_frames(
        &self,
        start_frame: u64,
        frame_count: usize,
        buffer: &mut Vec<f32>,
    ) -> Result<usize, AnalysisError> {
        buffer.clear();
        if start_frame >= self.total_frames || frame_count == 0 {
            return Ok(0);
        }

        let channels = self.channel_count();
        let frames = (self.total_frames - start_frame).min(frame_count as u64) as usize;
        let wanted = frames * channels;

        let mut reader = self.reader.lock().map_err(|_| AnalysisError::SourceRead {
            reason: "WAV reader lock poisoned".to_string(),
        })?;
        reader.seek(start_frame as u32)?;

        match self.spec.sample_format {
            hound::SampleFormat::Float => {
                for sample in reader.samples::<f32>().take(wanted) {
                    buffer.push(sample?);
                }
            }
            hound::SampleFormat::Int => {
                let max = ((1i64 << (self.spec.bits_per_sample - 1)) - 1) as f32;
                for sample in reader.samples::<i32>().take(wanted) {
                    buffer.push(sample? as f32 / max);
                }
            }
        }

        let read = buffer.len() / channels;
        buffer.truncate(read * channels);
        Ok(read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_fixture(name: &str, spec: hound::WavSpec, frames: usize) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "rehearsal_timeline_{}_{}.wav",
            name,
            std::process::id()
        ));
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..frames {
            for c in 0..spec.channels {
                match spec.sample_format {
                    hound::SampleFormat::Float => writer
                        .write_sample(((i + c as usize) % 100) as f32 / 100.0)
                        .unwrap(),
                    hound::SampleFormat::Int => writer
                        .write_sample((((i % 100) as i32) - 50) * 100)
                        .unwrap(),
                }
            }
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn test_float_wav_round_trip_range() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let path = write_fixture("float", spec, 1000);
        let source = WavSource::open(&path).unwrap();
        assert_eq!(source.total_frames(), 1000);
        assert_eq!(source.channel_count(), 2);

        let mut buffer = Vec::new();
        let read = source.read_frames(10, 4, &mut buffer).unwrap();
        assert_eq!(read, 4);
        assert_eq!(buffer.len(), 8);
        assert!((buffer[0] - 0.10).abs() < 1e-6);
        assert!((buffer[1] - 0.11).abs() < 1e-6);

        let read = source.read_frames(998, 10, &mut buffer).unwrap();
        assert_eq!(read, 2);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_int_wav_is_scaled() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let path = write_fixture("int16", spec, 200);
        let source = WavSource::open(&path).unwrap();
        let mut buffer = Vec::new();
        source.read_frames(0, 200, &mut buffer).unwrap();
        assert!(buffer.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert!((buffer[0] - (-5000.0 / 32767.0)).abs() < 1e-6);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_is_source_error() {
        match WavSource::open("/nonexistent/take.wav") {
            Err(AnalysisError::SourceRead { .. }) => {}
            Err(other) => panic!("Expected SourceRead, got {:?}", other),
            Ok(_) => panic!("Expected error"),
        }
    }
}
