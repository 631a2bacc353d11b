//! Per-job status record.
//!
//! A [`JobState`] is owned by whoever runs the job (the CLI, or an API
//! layer); the extraction core only ever sees it through a progress
//! callback.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Lifecycle of a conversion job.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    /// Accepted, not yet started.
    Pending,
    /// Running.
    Processing,
    /// Finished with an output table.
    Completed,
    /// Aborted by a fatal error or cancellation.
    Failed,
}

/// Status of a single conversion job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobState {
    /// Job identifier.
    pub id: Uuid,
    /// Current lifecycle stage.
    pub status: JobStatus,
    /// Percent complete, 0-100, never decreasing.
    pub progress: u8,
    /// Human-readable status line.
    pub message: String,
    /// Where the output table was written, once completed.
    pub output: Option<PathBuf>,
    /// Number of output rows, once completed.
    pub rows: Option<usize>,
}

impl JobState {
    /// Creates a pending job with a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Pending,
            progress: 0,
            message: "Queued".to_owned(),
            output: None,
            rows: None,
        }
    }

    /// Records a progress update. Percentages lower than the current one
    /// are ignored so progress never moves backwards.
    pub fn update(&mut self, percent: u8, message: &str) {
        if self.is_finished() {
            return;
        }
        self.status = JobStatus::Processing;
        self.progress = self.progress.max(percent.min(100));
        message.clone_into(&mut self.message);
    }

    /// Marks the job completed.
    pub fn complete(&mut self, output: Option<PathBuf>, rows: usize) {
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.message = format!("Conversion complete: {rows} rows");
        self.output = output;
        self.rows = Some(rows);
    }

    /// Marks the job failed with a human-readable reason.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.message = reason.into();
    }

    /// Whether the job has reached a terminal state.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self.status, JobStatus::Completed | JobStatus::Failed)
    }
}

impl Default for JobState {
    fn default() -> Self {
        Self::new()
    }
}
