//! Per-job outcome after reconciliation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The classified state of a single CI job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// The job has not reached a terminal state yet.
    Pending,
    /// The job finished successfully (or neutrally).
    Success,
    /// The job failed or errored.
    Error,
}

impl JobState {
    /// Classifies a combined-status `state` string.
    ///
    /// The legacy Status API reports `success`, `pending`, `error` and
    /// `failure`. Anything unrecognised is kept as pending so the gate keeps
    /// waiting instead of passing on an unknown value.
    pub fn from_status_state(state: &str) -> Self {
        match state {
            "success" => JobState::Success,
            "error" | "failure" => JobState::Error,
            _ => JobState::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Success => "success",
            JobState::Error => "error",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One job's outcome for the revision being gated.
///
/// Identity is the job name: after reconciliation at most one outcome exists
/// per name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub name: String,
    pub state: JobState,
}

impl JobOutcome {
    pub fn new(name: impl Into<String>, state: JobState) -> Self {
        JobOutcome {
            name: name.into(),
            state,
        }
    }
}
