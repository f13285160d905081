// Session - single owner of the current recording, analysis and timeline
//
// The session is the only writer of the segment list. Background runs hand
// over complete snapshots through the AnalysisManager channel; the session
// applies them when drained (`poll_analysis` / `wait_for_analysis`), so an
// edit never sees a half-replaced list. Edits take `&mut self` and are
// therefore serialized with publishes.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc};

use crate::analysis::features::FeaturePoint;
use crate::analysis::waveform::WaveformSample;
use crate::analysis::AnalysisSnapshot;
use crate::audio::{normalize_peak, normalize_rms, PcmSource};
use crate::config::AppConfig;
use crate::error::{log_analysis_error, AnalysisError, ErrorCode, ExportError, SegmentError};
use crate::export::{self, ExportPlan};
use crate::managers::{AnalysisEvent, AnalysisManager, BroadcastChannelManager};
use crate::segments::{SegmentId, SegmentList, SegmentType};

/// Change notification for observers of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    AnalysisPublished {
        generation: u64,
        duration: f64,
        segment_count: usize,
    },
    AnalysisFailed {
        generation: u64,
        code: i32,
        message: String,
    },
    SegmentsEdited {
        segment_count: usize,
    },
}

/// Restored timelines may differ from the recording length by this much (seconds)
const RESTORE_DURATION_TOLERANCE: f64 = 0.001;

/// Loudness normalization applied before re-analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationMode {
    /// Scale so the loudest sample hits the configured peak level
    Peak,
    /// Scale to the configured average RMS level, gain capped
    Rms,
}

pub struct Session {
    config: AppConfig,
    source: Option<Arc<dyn PcmSource>>,
    snapshot: Option<Arc<AnalysisSnapshot>>,
    segments: SegmentList,
    /// Generation whose result has not been applied yet
    pending_generation: Option<u64>,
    last_error: Option<AnalysisError>,
    analysis: AnalysisManager,
    analysis_rx: mpsc::UnboundedReceiver<AnalysisEvent>,
    broadcasts: BroadcastChannelManager,
}

impl Session {
    pub fn new(config: AppConfig) -> Self {
        let (analysis, analysis_rx) = AnalysisManager::new();
        let broadcasts = BroadcastChannelManager::new();
        broadcasts.init_session_events();
        Self {
            config,
            source: None,
            snapshot: None,
            segments: SegmentList::new(),
            pending_generation: None,
            last_error: None,
            analysis,
            analysis_rx,
            broadcasts,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Replace the configuration used by subsequent runs
    pub fn set_config(&mut self, config: AppConfig) {
        self.config = config;
    }

    pub fn subscribe(&self) -> Option<broadcast::Receiver<SessionEvent>> {
        self.broadcasts.subscribe_session_events()
    }

    /// Load a recording and start analysing it in the background
    ///
    /// The previous snapshot and timeline stay readable until the new result
    /// is applied. Returns the generation of the new run.
    pub fn load_source(&mut self, source: Arc<dyn PcmSource>) -> Result<u64, AnalysisError> {
        self.config.validate().map_err(|err| {
            log_analysis_error(&err, "load_source");
            err
        })?;
        self.source = Some(Arc::clone(&source));
        self.start_analysis(source)
    }

    /// Re-run the pipeline on the current source
    pub fn reanalyze(&mut self) -> Result<Option<u64>, AnalysisError> {
        match self.source.clone() {
            Some(source) => self.start_analysis(source).map(Some),
            None => Ok(None),
        }
    }

    /// Normalize the current source and re-run the whole pipeline on it
    ///
    /// The normalized copy replaces the source, so exports use it too. All
    /// timeline edits are discarded when the new analysis is applied.
    pub fn normalize_and_reanalyze(
        &mut self,
        mode: NormalizationMode,
    ) -> Result<Option<u64>, AnalysisError> {
        let Some(source) = self.source.clone() else {
            return Ok(None);
        };
        let settings = &self.config.normalization;
        let normalized = match mode {
            NormalizationMode::Peak => normalize_peak(source.as_ref(), settings.target_peak_db)?,
            NormalizationMode::Rms => {
                normalize_rms(source.as_ref(), settings.target_rms_db, settings.max_gain)?
            }
        };
        let normalized: Arc<dyn PcmSource> = Arc::new(normalized);
        self.source = Some(Arc::clone(&normalized));
        self.start_analysis(normalized).map(Some)
    }

    fn start_analysis(&mut self, source: Arc<dyn PcmSource>) -> Result<u64, AnalysisError> {
        let started = self.analysis.start(source, self.config.clone());
        self.track_started(started)
    }

    fn track_started(
        &mut self,
        started: Result<u64, AnalysisError>,
    ) -> Result<u64, AnalysisError> {
        match started {
            Ok(generation) => {
                self.pending_generation = Some(generation);
                Ok(generation)
            }
            Err(err) => {
                // The previous run is already cancelled; nothing will publish
                self.pending_generation = None;
                log_analysis_error(&err, "start_analysis");
                Err(err)
            }
        }
    }

    /// Cancel the in-flight analysis; the current timeline stays
    pub fn cancel_analysis(&mut self) {
        self.analysis.cancel();
        self.pending_generation = None;
    }

    pub fn is_analyzing(&self) -> bool {
        self.pending_generation.is_some()
    }

    /// Apply every analysis result that has arrived, without blocking
    ///
    /// Returns the number of events applied (stale ones are not counted).
    pub fn poll_analysis(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.analysis_rx.try_recv() {
            if self.apply_analysis_event(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Block until the latest started run has been applied
    ///
    /// Returns immediately when no run is pending. Must not be called from
    /// inside an async runtime.
    pub fn wait_for_analysis(&mut self) -> Result<(), AnalysisError> {
        while self.pending_generation.is_some() {
            match self.analysis_rx.blocking_recv() {
                Some(event) => {
                    self.apply_analysis_event(event);
                }
                None => {
                    self.pending_generation = None;
                    return Err(AnalysisError::WorkerPanicked);
                }
            }
        }
        match &self.last_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn apply_analysis_event(&mut self, event: AnalysisEvent) -> bool {
        let generation = event.generation();
        if !self.analysis.is_current(generation) || self.pending_generation != Some(generation) {
            tracing::debug!(generation, "[Session] Ignoring stale analysis event");
            return false;
        }
        self.pending_generation = None;

        match event {
            AnalysisEvent::Published(snapshot) => {
                self.segments = snapshot.segments.clone();
                self.last_error = None;
                tracing::info!(
                    generation,
                    segments = self.segments.len(),
                    "[Session] Analysis published"
                );
                self.broadcasts.publish(SessionEvent::AnalysisPublished {
                    generation,
                    duration: snapshot.duration,
                    segment_count: self.segments.len(),
                });
                self.snapshot = Some(snapshot);
            }
            AnalysisEvent::Failed { error, .. } => {
                log_analysis_error(&error, "session");
                self.broadcasts.publish(SessionEvent::AnalysisFailed {
                    generation,
                    code: error.code(),
                    message: error.message(),
                });
                self.last_error = Some(error);
            }
        }
        true
    }

    pub fn snapshot(&self) -> Option<&Arc<AnalysisSnapshot>> {
        self.snapshot.as_ref()
    }

    pub fn last_error(&self) -> Option<&AnalysisError> {
        self.last_error.as_ref()
    }

    pub fn waveform(&self) -> &[WaveformSample] {
        self.snapshot
            .as_deref()
            .map(|s| s.waveform.as_slice())
            .unwrap_or_default()
    }

    pub fn features(&self) -> &[FeaturePoint] {
        self.snapshot
            .as_deref()
            .map(|s| s.features.as_slice())
            .unwrap_or_default()
    }

    pub fn segments(&self) -> &SegmentList {
        &self.segments
    }

    /// Replace the timeline with one restored from project storage
    ///
    /// # Errors
    /// `DurationMismatch` when a recording is loaded and a non-empty timeline
    /// does not end at its duration. The current timeline is kept.
    pub fn restore_segments(&mut self, segments: SegmentList) -> Result<(), SegmentError> {
        let expected = self
            .source
            .as_ref()
            .map(|source| source.duration_secs())
            .or_else(|| self.snapshot.as_ref().map(|snapshot| snapshot.duration));
        if let Some(expected) = expected {
            let actual = segments.total_duration();
            if !segments.is_empty() && (actual - expected).abs() > RESTORE_DURATION_TOLERANCE {
                let err = SegmentError::DurationMismatch { expected, actual };
                tracing::warn!(
                    code = err.code(),
                    "[Session] Rejected restored timeline: {}",
                    err.message()
                );
                return Err(err);
            }
        }
        self.segments = segments;
        self.notify_edited(true);
        Ok(())
    }

    fn notify_edited(&self, changed: bool) -> bool {
        if changed {
            self.broadcasts.publish(SessionEvent::SegmentsEdited {
                segment_count: self.segments.len(),
            });
        }
        changed
    }

    pub fn update_type(&mut self, id: SegmentId, segment_type: SegmentType) -> bool {
        let changed = self.segments.update_type(id, segment_type);
        self.notify_edited(changed)
    }

    pub fn update_label(&mut self, id: SegmentId, label: &str) -> bool {
        let changed = self.segments.update_label(id, label);
        self.notify_edited(changed)
    }

    pub fn update_transcription(&mut self, id: SegmentId, transcription: Option<String>) -> bool {
        let changed = self.segments.update_transcription(id, transcription);
        self.notify_edited(changed)
    }

    pub fn update_export_exclusion(&mut self, id: SegmentId, excluded: bool) -> bool {
        let changed = self.segments.update_export_exclusion(id, excluded);
        self.notify_edited(changed)
    }

    pub fn move_boundary(&mut self, index: usize, new_time: f64) -> bool {
        let changed = self.segments.move_boundary(index, new_time);
        self.notify_edited(changed)
    }

    pub fn split_segment(&mut self, at_time: f64) -> bool {
        let changed = self.segments.split_segment(at_time);
        self.notify_edited(changed)
    }

    pub fn merge_with_next(&mut self, id: SegmentId) -> bool {
        let changed = self.segments.merge_with_next(id);
        self.notify_edited(changed)
    }

    /// Plan an export of the current timeline
    pub fn export_plan(&self, filter: Option<SegmentType>) -> Result<ExportPlan, ExportError> {
        export::plan(&self.segments, filter)
    }

    /// Render the current timeline selection to a WAV file
    pub fn export_wav<P: AsRef<Path>>(
        &self,
        filter: Option<SegmentType>,
        path: P,
    ) -> Result<u64, ExportError> {
        let Some(source) = self.source.as_ref() else {
            return Err(ExportError::NoSegments);
        };
        let plan = self.export_plan(filter)?;
        export::write_wav(source.as_ref(), &plan, path)
    }
}
