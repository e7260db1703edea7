//! Exclusion policy and aggregation of job outcomes into a report.

use serde::{Deserialize, Serialize};

use crate::types::{JobOutcome, JobState};

/// Which jobs are left out of the pass/fail accounting.
///
/// Excluded jobs still count toward the success tally, so an excluded job
/// can never hold the gate open or fail it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionPolicy {
    /// The gate's own job name.
    pub self_job: String,

    /// Operator-declared names to ignore, in configured order.
    pub ignored: Vec<String>,
}

impl ExclusionPolicy {
    pub fn new(self_job: impl Into<String>, ignored: Vec<String>) -> Self {
        ExclusionPolicy {
            self_job: self_job.into(),
            ignored,
        }
    }

    /// Returns true if `name` is the self job or one of the ignored jobs.
    ///
    /// Ignored names are compared after trimming surrounding whitespace.
    pub fn is_excluded(&self, name: &str) -> bool {
        name == self.self_job || self.ignored.iter().any(|ignored| ignored.trim() == name)
    }

    /// The ignored names as they appear in reports.
    pub fn ignored_names(&self) -> Vec<String> {
        self.ignored.iter().map(|s| s.trim().to_string()).collect()
    }
}

/// The result of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedReport {
    /// Every counted job, in encounter order.
    pub total_jobs: Vec<String>,

    /// Counted jobs that succeeded.
    pub complete_jobs: Vec<String>,

    /// Counted jobs that failed.
    pub failed_jobs: Vec<String>,

    /// The configured ignored names.
    pub ignored_jobs: Vec<String>,

    pub succeeded: bool,
}

impl AggregatedReport {
    /// Returns true if at least one counted job failed.
    pub fn has_failures(&self) -> bool {
        !self.failed_jobs.is_empty()
    }

    /// Counted jobs that have neither succeeded nor failed yet.
    pub fn incomplete_jobs(&self) -> Vec<&str> {
        self.total_jobs
            .iter()
            .filter(|job| !self.complete_jobs.contains(job) && !self.failed_jobs.contains(job))
            .map(String::as_str)
            .collect()
    }
}

/// Partitions `outcomes` into a report under `policy`.
pub fn aggregate(outcomes: &[JobOutcome], policy: &ExclusionPolicy) -> AggregatedReport {
    let mut report = AggregatedReport {
        total_jobs: Vec::with_capacity(outcomes.len()),
        complete_jobs: Vec::with_capacity(outcomes.len()),
        failed_jobs: Vec::new(),
        ignored_jobs: policy.ignored_names(),
        succeeded: false,
    };
    let mut tally = 0usize;

    for outcome in outcomes {
        if policy.is_excluded(&outcome.name) {
            tally += 1;
            continue;
        }

        report.total_jobs.push(outcome.name.clone());
        match outcome.state {
            JobState::Success => {
                report.complete_jobs.push(outcome.name.clone());
                tally += 1;
            }
            JobState::Error => report.failed_jobs.push(outcome.name.clone()),
            JobState::Pending => {}
        }
    }

    report.succeeded = report.failed_jobs.is_empty() && tally == outcomes.len();
    report
}
