//! Progress reporting for document extraction.
//!
//! Defines a [`ProgressCallback`] trait that decouples progress reporting
//! from any specific rendering backend (an `indicatif` bar, a job-state
//! record, or silence). Extraction reports percentages in `0..=100` that
//! never decrease, and never waits on the callback.

use std::sync::Arc;

use crate::config::ProgressConfig;

/// Percentage reported once the layout is known and row processing starts.
pub const START_PERCENT: u8 = 10;

/// Percentage reported once every page or line has been processed.
pub const END_PERCENT: u8 = 90;

/// Receives progress notifications.
///
/// Implementations must be `Send + Sync` so a callback can be shared with
/// a blocking worker thread.
pub trait ProgressCallback: Send + Sync {
    /// Reports `percent` complete with a human-readable status.
    fn report(&self, percent: u8, message: &str);
}

/// A no-op [`ProgressCallback`].
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn report(&self, _percent: u8, _message: &str) {}
}

/// Returns a shared [`NullProgress`] instance for convenient use.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}

/// Throttles per-page updates and keeps them monotonic.
pub struct ProgressTracker<'a> {
    callback: &'a dyn ProgressCallback,
    every_percent: u8,
    total: usize,
    last: u8,
}

impl<'a> ProgressTracker<'a> {
    /// Creates a tracker for `total` units of work.
    #[must_use]
    pub fn new(callback: &'a dyn ProgressCallback, config: &ProgressConfig, total: usize) -> Self {
        Self {
            callback,
            every_percent: config.every_percent.max(1),
            total,
            last: 0,
        }
    }

    /// Reports a fixed milestone. Ignored if it would move backwards.
    pub fn milestone(&mut self, percent: u8, message: &str) {
        let percent = percent.min(100);
        if percent >= self.last {
            self.last = percent;
            self.callback.report(percent, message);
        }
    }

    /// Records that unit `index` (zero-based) finished.
    ///
    /// Emits when progress moved at least `every_percent` since the last
    /// report, and always for the final unit.
    pub fn unit_done(&mut self, index: usize, label: &str) {
        if self.total == 0 {
            return;
        }
        let done = (index + 1).min(self.total);
        let span = usize::from(END_PERCENT - START_PERCENT);
        let percent = START_PERCENT + u8::try_from(done * span / self.total).unwrap_or(0);
        let is_last = done == self.total;

        if is_last || percent.saturating_sub(self.last) >= self.every_percent {
            self.milestone(
                percent,
                &format!("Processing {label} {done} of {}", self.total),
            );
        }
    }
}
