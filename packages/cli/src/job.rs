//! Job-state handle shared between the CLI and the extraction worker.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use statement_table_extract::ProgressCallback;
use statement_table_models::job::JobState;

/// A cloneable handle to one job's [`JobState`].
///
/// Progress reports update the state and are forwarded to a display
/// callback. The worker never waits for the lock: if the state is busy, the
/// update is skipped, since a later report supersedes it anyway.
#[derive(Clone)]
pub struct JobHandle {
    state: Arc<Mutex<JobState>>,
    display: Arc<dyn ProgressCallback>,
}

impl JobHandle {
    /// Creates a handle for a new pending job.
    #[must_use]
    pub fn new(display: Arc<dyn ProgressCallback>) -> Self {
        Self {
            state: Arc::new(Mutex::new(JobState::new())),
            display,
        }
    }

    /// A copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> JobState {
        self.state
            .lock()
            .map_or_else(|poisoned| poisoned.into_inner().clone(), |state| state.clone())
    }

    /// Marks the job completed.
    pub fn complete(&self, output: PathBuf, rows: usize) {
        self.with_state(|state| state.complete(Some(output), rows));
    }

    /// Marks the job failed.
    pub fn fail(&self, reason: &str) {
        self.with_state(|state| state.fail(reason));
    }

    fn with_state(&self, f: impl FnOnce(&mut JobState)) {
        match self.state.lock() {
            Ok(mut state) => f(&mut state),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

impl ProgressCallback for JobHandle {
    fn report(&self, percent: u8, message: &str) {
        if let Ok(mut state) = self.state.try_lock() {
            state.update(percent, message);
        }
        self.display.report(percent, message);
    }
}

#[cfg(test)]
mod tests {
    use statement_table_extract::null_progress;
    use statement_table_models::job::JobStatus;

    use super::*;

    #[test]
    fn reports_drive_the_job_state() {
        let job = JobHandle::new(null_progress());
        job.report(10, "Detected 6 columns");
        job.report(55, "Processing page 3 of 6");

        let state = job.snapshot();
        assert_eq!(state.status, JobStatus::Processing);
        assert_eq!(state.progress, 55);
        assert_eq!(state.message, "Processing page 3 of 6");
    }

    #[test]
    fn clones_share_one_state() {
        let job = JobHandle::new(null_progress());
        let worker = job.clone();
        worker.report(30, "working");
        job.fail("cancelled");

        worker.report(90, "too late");
        let state = job.snapshot();
        assert_eq!(state.status, JobStatus::Failed);
        assert_eq!(state.message, "cancelled");
        assert_eq!(state.progress, 30);
    }

    #[test]
    fn completion_records_output() {
        let job = JobHandle::new(null_progress());
        job.complete(PathBuf::from("statement.csv"), 3);
        let state = job.snapshot();
        assert_eq!(state.status, JobStatus::Completed);
        assert_eq!(state.rows, Some(3));
        assert_eq!(state.output, Some(PathBuf::from("statement.csv")));
    }
}
