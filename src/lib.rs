// Rehearsal Timeline Core - audio analysis and timeline editing
// Segments a rehearsal recording into silence, performance and conversation
// with a streaming DSP pipeline, and keeps the resulting timeline consistent
// under user edits.

// Module declarations
pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod export;
pub mod managers;
pub mod segments;
pub mod session;

// Re-exports for convenience
pub use analysis::cancel::CancellationToken;
pub use analysis::classifier::{Classifier, RawSegment};
pub use analysis::features::{extract_features, FeatureExtractor, FeaturePoint};
pub use analysis::smoother::Smoother;
pub use analysis::waveform::{downsample_buffer, downsample_source, WaveformSample};
pub use analysis::{run_pipeline, AnalysisSnapshot, PipelineOutcome};
pub use audio::{MemorySource, PcmSource, WavSource};
pub use config::AppConfig;
pub use segments::{Segment, SegmentId, SegmentList, SegmentType};
pub use session::{NormalizationMode, Session, SessionEvent};

use std::str::FromStr;

/// Environment variable holding the log level (`error` .. `trace`)
pub const LOG_LEVEL_ENV: &str = "TIMELINE_LOG";

/// Initialize logging for host applications and the CLI
///
/// Installs a `tracing_subscriber` fmt subscriber, which also forwards
/// `log` records. The level comes from `TIMELINE_LOG` and defaults to
/// `info`. Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let level = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|value| tracing::Level::from_str(&value).ok())
        .unwrap_or(tracing::Level::INFO);

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
