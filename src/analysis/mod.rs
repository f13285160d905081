// Analysis module - DSP pipeline from PCM to a smoothed segment timeline
//
// This module orchestrates the complete analysis of one recording:
//
// Architecture:
// - Pipeline: Downsampler → FeatureExtractor → Classifier → Smoother
// - Output: one immutable AnalysisSnapshot per run
// - Cancellation: the streaming stages poll a CancellationToken per chunk /
//   window; a cancelled run reports Superseded, never Failed
//
// The pipeline is a pure function of the source and the config. Threading and
// publishing live in `managers::analysis_manager`.

use std::time::Instant;

use serde::Serialize;

use crate::audio::PcmSource;
use crate::config::AppConfig;
use crate::error::{log_analysis_error, AnalysisError};
use crate::segments::SegmentList;

pub mod cancel;
pub mod classifier;
pub mod features;
pub mod smoother;
pub mod waveform;

use cancel::CancellationToken;
use classifier::Classifier;
use features::FeaturePoint;
use smoother::Smoother;
use waveform::WaveformSample;

/// Complete result of one pipeline run
///
/// Built in full on the worker and never mutated afterwards; consumers swap
/// their reference to a new snapshot instead of patching an old one.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisSnapshot {
    /// Generation of the run that produced this snapshot
    pub generation: u64,
    pub sample_rate: u32,
    pub channels: usize,
    /// Source length in seconds
    pub duration: f64,
    pub waveform: Vec<WaveformSample>,
    pub features: Vec<FeaturePoint>,
    pub segments: SegmentList,
}

/// How a pipeline run ended
#[derive(Debug)]
pub enum PipelineOutcome {
    Completed(AnalysisSnapshot),
    /// Cancelled, usually because a newer run started. Not an error.
    Superseded,
    Failed(AnalysisError),
}

impl PipelineOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, PipelineOutcome::Completed(_))
    }
}

/// Run all four stages over `source`
///
/// Empty audio (no frames) completes with an empty snapshot. Audio shorter
/// than one feature window completes with a waveform but no features and no
/// segments.
pub fn run_pipeline(
    source: &dyn PcmSource,
    config: &AppConfig,
    cancel: &CancellationToken,
) -> PipelineOutcome {
    let started = Instant::now();
    let generation = cancel.generation();

    if let Err(err) = config.validate() {
        log_analysis_error(&err, "run_pipeline");
        return PipelineOutcome::Failed(err);
    }

    let mut snapshot = AnalysisSnapshot {
        generation,
        sample_rate: source.sample_rate(),
        channels: source.channel_count(),
        duration: source.duration_secs(),
        ..Default::default()
    };

    tracing::info!(
        generation,
        sample_rate = snapshot.sample_rate,
        channels = snapshot.channels,
        total_frames = source.total_frames(),
        "[Pipeline] Starting analysis"
    );

    if source.total_frames() == 0 || snapshot.channels == 0 {
        tracing::info!(generation, "[Pipeline] Empty source, nothing to analyse");
        return PipelineOutcome::Completed(snapshot);
    }

    // Stage 1: waveform overview
    snapshot.waveform = match waveform::downsample_source(
        source,
        config.waveform.target_sample_count,
        config.waveform.chunk_frames,
        cancel,
    ) {
        Ok(waveform) => waveform,
        Err(err) => return fail(err, "downsample"),
    };
    if cancel.is_cancelled() {
        return superseded(generation, "downsample");
    }

    // Stage 2: per-window features
    snapshot.features = match features::extract_features(source, &config.features, cancel) {
        Ok(points) => points,
        Err(err) => return fail(err, "extract_features"),
    };
    if cancel.is_cancelled() {
        return superseded(generation, "extract_features");
    }

    // Stages 3 and 4: classification and smoothing
    let classifier = Classifier::new(config.classifier.clone());
    let raw = classifier.classify_until(&snapshot.features, snapshot.duration);
    let smoothed = Smoother::new(config.smoothing.min_duration).smooth(&raw);
    snapshot.segments = SegmentList::from_raw(&smoothed);

    if cancel.is_cancelled() {
        return superseded(generation, "smooth");
    }

    tracing::info!(
        generation,
        waveform_samples = snapshot.waveform.len(),
        feature_points = snapshot.features.len(),
        raw_runs = raw.len(),
        segments = snapshot.segments.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "[Pipeline] Analysis complete"
    );

    PipelineOutcome::Completed(snapshot)
}

fn fail(err: AnalysisError, stage: &str) -> PipelineOutcome {
    log_analysis_error(&err, stage);
    PipelineOutcome::Failed(err)
}

fn superseded(generation: u64, stage: &str) -> PipelineOutcome {
    tracing::debug!(generation, stage, "[Pipeline] Run superseded");
    PipelineOutcome::Superseded
}
