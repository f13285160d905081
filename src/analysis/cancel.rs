// Cancellation token for pipeline runs
//
// A run is cancelled either explicitly or implicitly, when a newer run bumps
// the shared generation counter past the run's own generation. Stages poll
// `is_cancelled()` once per window/chunk and stop early; the pipeline then
// reports the run as superseded.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl CancellationToken {
    /// Token that only cancels when `cancel()` is called
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            generation: 0,
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Token for run `generation`, stale as soon as `latest` moves past it
    pub fn for_generation(generation: u64, latest: Arc<AtomicU64>) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            generation,
            latest,
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire) || self.latest.load(Ordering::Acquire) != self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_cancel() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_newer_generation_supersedes() {
        let latest = Arc::new(AtomicU64::new(1));
        let token = CancellationToken::for_generation(1, Arc::clone(&latest));
        assert!(!token.is_cancelled());
        latest.store(2, Ordering::Release);
        assert!(token.is_cancelled());
    }
}
