use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Progress tracking and cooperative cancellation for a sweep.
///
/// Clones share the same counters, so one handle can be polled or cancelled
/// from another thread while the sweep runs.
#[derive(Debug, Clone)]
pub struct SweepProgress {
    /// Completed trials
    completed: Arc<AtomicUsize>,
    /// Total trials across all scenarios
    total: Arc<AtomicUsize>,
    /// Completed scenarios
    scenarios: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
}

impl SweepProgress {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            completed: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(AtomicUsize::new(total)),
            scenarios: Arc::new(AtomicUsize::new(0)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create from existing atomics (for UI integration)
    pub fn from_atomics(
        completed: Arc<AtomicUsize>,
        total: Arc<AtomicUsize>,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            completed,
            total,
            scenarios: Arc::new(AtomicUsize::new(0)),
            cancelled,
        }
    }

    /// Get the number of completed trials
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    /// Get the total number of trials
    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn scenarios_completed(&self) -> usize {
        self.scenarios.load(Ordering::Relaxed)
    }

    /// Completed share of all trials, in [0, 1]
    #[must_use]
    pub fn fraction(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.completed() as f64 / total as f64).min(1.0)
    }

    /// Increment the completed trial counter
    pub fn increment(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn finish_scenario(&self) {
        self.scenarios.fetch_add(1, Ordering::Relaxed);
    }

    /// Reset the counters for a new sweep. The cancellation flag is kept.
    pub fn reset(&self, total: usize) {
        self.completed.store(0, Ordering::Relaxed);
        self.scenarios.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    /// Ask the sweep to stop. Running scenarios finish; no new ones start.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

impl Default for SweepProgress {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_counters() {
        let progress = SweepProgress::new(10);
        let handle = progress.clone();
        handle.increment();
        handle.increment();
        assert_eq!(progress.completed(), 2);
        assert!((progress.fraction() - 0.2).abs() < 1e-12);

        handle.cancel();
        assert!(progress.is_cancelled());

        progress.reset(4);
        assert_eq!(handle.completed(), 0);
        assert_eq!(handle.total(), 4);
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_fraction_with_no_work() {
        assert_eq!(SweepProgress::default().fraction(), 0.0);
    }
}
