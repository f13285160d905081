// Export - select timeline ranges and render them to a WAV file
//
// A plan lists the segments that survive the export filter, in timeline
// order. Writing concatenates their frame ranges from the source into one
// 32-bit float WAV.

use std::path::Path;

use serde::Serialize;

use crate::audio::PcmSource;
use crate::error::{log_export_error, ExportError};
use crate::segments::{SegmentId, SegmentList, SegmentType};

/// Boost applied to conversation-only exports, which are typically quieter
const CONVERSATION_GAIN: f32 = 1.5;

/// Frames read per chunk while rendering
const EXPORT_CHUNK_FRAMES: usize = 65_536;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRange {
    pub segment_id: SegmentId,
    pub start_time: f64,
    pub end_time: f64,
    pub segment_type: SegmentType,
}

impl ExportRange {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportPlan {
    pub filter: Option<SegmentType>,
    pub ranges: Vec<ExportRange>,
}

impl ExportPlan {
    /// Length of the rendered file in seconds
    pub fn duration(&self) -> f64 {
        self.ranges.iter().map(ExportRange::duration).sum()
    }

    pub fn gain(&self) -> f32 {
        match self.filter {
            Some(SegmentType::Conversation) => CONVERSATION_GAIN,
            _ => 1.0,
        }
    }
}

/// Select the segments to export
///
/// Segments flagged `excluded_from_export` are always skipped; `filter`
/// further restricts the selection to one type.
///
/// # Errors
/// `ExportError::NoSegments` when nothing is left
pub fn plan(segments: &SegmentList, filter: Option<SegmentType>) -> Result<ExportPlan, ExportError> {
    let ranges: Vec<ExportRange> = segments
        .iter()
        .filter(|s| !s.excluded_from_export)
        .filter(|s| filter.map_or(true, |t| s.segment_type == t))
        .map(|s| ExportRange {
            segment_id: s.id,
            start_time: s.start_time,
            end_time: s.end_time,
            segment_type: s.segment_type,
        })
        .collect();

    if ranges.is_empty() {
        return Err(ExportError::NoSegments);
    }
    Ok(ExportPlan { filter, ranges })
}

/// Render `plan` from `source` into a WAV file at `path`
///
/// Keeps the source's sample rate and channel count. Samples are scaled by
/// the plan gain and clamped to [-1, 1].
///
/// # Returns
/// Number of frames written
pub fn write_wav<P: AsRef<Path>>(
    source: &dyn PcmSource,
    plan: &ExportPlan,
    path: P,
) -> Result<u64, ExportError> {
    render(source, plan, path.as_ref()).map_err(|err| {
        log_export_error(&err, "write_wav");
        err
    })
}

fn render(source: &dyn PcmSource, plan: &ExportPlan, path: &Path) -> Result<u64, ExportError> {
    if plan.ranges.is_empty() {
        return Err(ExportError::NoSegments);
    }

    let sample_rate = source.sample_rate();
    let channels = source.channel_count();
    let total_frames = source.total_frames();
    let spec = hound::WavSpec {
        channels: channels as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let gain = plan.gain();
    let mut writer = hound::WavWriter::create(path, spec)?;
    let mut chunk = Vec::with_capacity(EXPORT_CHUNK_FRAMES * channels);
    let mut written = 0u64;

    for range in &plan.ranges {
        let start = seconds_to_frame(range.start_time, sample_rate).min(total_frames);
        let end = seconds_to_frame(range.end_time, sample_rate).min(total_frames);
        let mut position = start;

        while position < end {
            let wanted = (end - position).min(EXPORT_CHUNK_FRAMES as u64) as usize;
            let read = source.read_frames(position, wanted, &mut chunk)?;
            if read == 0 {
                break;
            }
            for &sample in &chunk[..read * channels] {
                writer.write_sample((sample * gain).clamp(-1.0, 1.0))?;
            }
            position += read as u64;
            written += read as u64;
        }
    }

    writer.finalize()?;

    log::info!(
        "[Export] Wrote {} frames ({} ranges, gain {:.1}) to {:?}",
        written,
        plan.ranges.len(),
        gain,
        path
    );
    Ok(written)
}

fn seconds_to_frame(seconds: f64, sample_rate: u32) -> u64 {
    (seconds.max(0.0) * sample_rate as f64).round() as u64
}
