// AnalysisManager: background pipeline runs with generation-based cancellation
//
// Single Responsibility: worker thread lifecycle and result hand-off
//
// Every `start()` bumps the generation counter, which implicitly cancels the
// previous run (its token compares against the counter) and explicitly sets
// its cancel flag. The worker sends its snapshot over an unbounded mpsc
// channel only if it is still current; the receiving session re-checks the
// generation before applying it.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc;

use crate::analysis::cancel::CancellationToken;
use crate::analysis::{run_pipeline, AnalysisSnapshot, PipelineOutcome};
use crate::audio::PcmSource;
use crate::config::AppConfig;
use crate::error::{log_analysis_error, AnalysisError};

/// Message from a worker to the owning session
#[derive(Debug, Clone)]
pub enum AnalysisEvent {
    Published(Arc<AnalysisSnapshot>),
    Failed {
        generation: u64,
        error: AnalysisError,
    },
}

impl AnalysisEvent {
    pub fn generation(&self) -> u64 {
        match self {
            AnalysisEvent::Published(snapshot) => snapshot.generation,
            AnalysisEvent::Failed { generation, .. } => *generation,
        }
    }
}

/// In-flight run bookkeeping
struct RunningAnalysis {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Manages background analysis runs
///
/// # Example
/// ```ignore
/// let (manager, mut events) = AnalysisManager::new();
/// let generation = manager.start(source, AppConfig::default())?;
/// let event = events.blocking_recv();
/// ```
pub struct AnalysisManager {
    latest_generation: Arc<AtomicU64>,
    running: Mutex<Option<RunningAnalysis>>,
    events_tx: mpsc::UnboundedSender<AnalysisEvent>,
}

impl AnalysisManager {
    /// Create a manager and the receiver its workers publish to
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AnalysisEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let manager = Self {
            latest_generation: Arc::new(AtomicU64::new(0)),
            running: Mutex::new(None),
            events_tx,
        };
        (manager, events_rx)
    }

    /// Generation of the most recently started run (0 before the first)
    pub fn latest_generation(&self) -> u64 {
        self.latest_generation.load(Ordering::Acquire)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation != 0 && generation == self.latest_generation()
    }

    fn lock_running(&self) -> MutexGuard<'_, Option<RunningAnalysis>> {
        // The guarded data is only bookkeeping; recover it after a poison
        self.running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a pipeline run on a new worker thread
    ///
    /// Cancels the previous run first. Returns the new run's generation.
    ///
    /// # Errors
    /// `WorkerSpawn` if the worker thread cannot be spawned
    pub fn start(
        &self,
        source: Arc<dyn PcmSource>,
        config: AppConfig,
    ) -> Result<u64, AnalysisError> {
        let mut running = self.lock_running();

        let generation = self.latest_generation.fetch_add(1, Ordering::AcqRel) + 1;
        if let Some(previous) = running.take() {
            previous.token.cancel();
            tracing::debug!(
                previous = previous.token.generation(),
                generation,
                "[AnalysisManager] Cancelled previous run"
            );
            // The previous worker exits on its own; it is not joined here
            drop(previous.handle);
        }

        let token =
            CancellationToken::for_generation(generation, Arc::clone(&self.latest_generation));
        let worker_token = token.clone();
        let events_tx = self.events_tx.clone();

        let handle = thread::Builder::new()
            .name(format!("analysis-{}", generation))
            .spawn(move || run_worker(source, config, worker_token, events_tx))
            .map_err(|err| {
                tracing::error!(
                    generation,
                    error = %err,
                    "[AnalysisManager] Failed to spawn worker"
                );
                AnalysisError::WorkerSpawn {
                    reason: err.to_string(),
                }
            })?;

        tracing::info!(generation, "[AnalysisManager] Analysis started");
        *running = Some(RunningAnalysis { token, handle });
        Ok(generation)
    }

    /// Cancel the in-flight run, if any
    ///
    /// A cancelled run publishes nothing.
    pub fn cancel(&self) {
        if let Some(running) = self.lock_running().take() {
            running.token.cancel();
            tracing::info!(
                generation = running.token.generation(),
                "[AnalysisManager] Analysis cancelled"
            );
        }
    }

    /// Whether the most recent run's worker thread is still alive
    pub fn is_running(&self) -> bool {
        self.lock_running()
            .as_ref()
            .map_or(false, |running| !running.handle.is_finished())
    }
}

impl Drop for AnalysisManager {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn run_worker(
    source: Arc<dyn PcmSource>,
    config: AppConfig,
    token: CancellationToken,
    events_tx: mpsc::UnboundedSender<AnalysisEvent>,
) {
    let generation = token.generation();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        run_pipeline(source.as_ref(), &config, &token)
    }))
    .unwrap_or_else(|_| {
        let err = AnalysisError::WorkerPanicked;
        log_analysis_error(&err, "analysis_worker");
        PipelineOutcome::Failed(err)
    });

    // A run that went stale while finishing must not publish
    if token.is_cancelled() {
        tracing::debug!(generation, "[AnalysisManager] Dropping result of superseded run");
        return;
    }

    let event = match outcome {
        PipelineOutcome::Completed(snapshot) => AnalysisEvent::Published(Arc::new(snapshot)),
        PipelineOutcome::Failed(error) => AnalysisEvent::Failed { generation, error },
        PipelineOutcome::Superseded => return,
    };

    if events_tx.send(event).is_err() {
        tracing::debug!(generation, "[AnalysisManager] Session gone, result discarded");
    }
}
