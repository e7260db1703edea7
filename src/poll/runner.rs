//! The polling control loop.
//!
//! ```text
//! Waiting ──tick──▶ Evaluating ──all succeeded──▶ Done(success)
//!    ▲                 │  └─────failure/error──▶ Done(failure)
//!    └──incomplete─────┘
//! ```
//!
//! Cancellation and the deadline are checked before every tick and raced
//! against every in-flight pass; both win over a pass that is still running.

use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::status::{AggregatedReport, FetchError, ValidateError, Validator};

use super::config::PollConfig;

/// Ways the polling loop can end without success.
#[derive(Debug, Error)]
pub enum PollError {
    /// The poll interval is zero.
    #[error("poll interval must be greater than zero")]
    InvalidInterval,

    /// A validator reported failed jobs.
    ///
    /// `reports` holds this pass's reports up to and including the failing one.
    #[error("validator {validator} reported failed jobs")]
    JobsFailed {
        validator: String,
        reports: Vec<AggregatedReport>,
    },

    /// A validator could not complete its pass.
    #[error("validator {validator} failed: {source}")]
    Validation {
        validator: String,
        #[source]
        source: FetchError,
        last_reports: Vec<AggregatedReport>,
    },

    /// The deadline elapsed before every validator succeeded.
    #[error("validation timed out after {}s", .timeout.as_secs())]
    TimedOut {
        timeout: Duration,
        last_reports: Vec<AggregatedReport>,
    },

    /// The cancellation token fired.
    #[error("validation cancelled")]
    Cancelled { last_reports: Vec<AggregatedReport> },
}

impl PollError {
    /// The most recent reports available when the loop ended.
    pub fn reports(&self) -> &[AggregatedReport] {
        match self {
            PollError::InvalidInterval => &[],
            PollError::JobsFailed { reports, .. } => reports,
            PollError::Validation { last_reports, .. }
            | PollError::TimedOut { last_reports, .. }
            | PollError::Cancelled { last_reports } => last_reports,
        }
    }

    /// Attaches the reports of the previous pass to a fetch failure.
    fn with_last_reports(self, reports: Vec<AggregatedReport>) -> Self {
        match self {
            PollError::Validation {
                validator, source, ..
            } => PollError::Validation {
                validator,
                source,
                last_reports: reports,
            },
            other => other,
        }
    }

    /// Returns true if this is a cancellation error.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PollError::Cancelled { .. })
    }
}

/// Result of one evaluation pass over every validator.
#[derive(Debug)]
enum PassOutcome {
    Complete(Vec<AggregatedReport>),
    Incomplete(Vec<AggregatedReport>),
}

/// Polls `validators` until they all succeed, one fails, the deadline
/// passes, or `cancel` fires.
///
/// The first pass runs immediately. On success the final report of each
/// validator is returned, in order.
#[instrument(skip_all, fields(validators = validators.len(), interval_s = config.interval.as_secs(), timeout_s = config.timeout.as_secs()))]
pub async fn run_until_complete<V: Validator>(
    validators: &[V],
    config: &PollConfig,
    cancel: &CancellationToken,
) -> Result<Vec<AggregatedReport>, PollError> {
    config.validate()?;

    let start = Instant::now();
    let deadline = tokio::time::sleep(config.timeout);
    tokio::pin!(deadline);

    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last_reports: Vec<AggregatedReport> = Vec::new();
    let mut pass = 0u64;

    debug!(max_passes = config.max_passes(), "Starting validation loop");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(passes = pass, "Validation cancelled");
                return Err(PollError::Cancelled { last_reports });
            }
            _ = &mut deadline => {
                warn!(passes = pass, "Validation timed out");
                return Err(PollError::TimedOut { timeout: config.timeout, last_reports });
            }
            _ = ticker.tick() => {}
        }

        pass += 1;
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(pass, "Validation cancelled during evaluation");
                return Err(PollError::Cancelled { last_reports });
            }
            _ = &mut deadline => {
                warn!(pass, "Validation timed out during evaluation");
                return Err(PollError::TimedOut { timeout: config.timeout, last_reports });
            }
            outcome = evaluate(validators) => outcome,
        };
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => return Err(e.with_last_reports(last_reports)),
        };

        match outcome {
            PassOutcome::Complete(reports) => {
                info!(
                    pass,
                    elapsed_s = start.elapsed().as_secs(),
                    "All validations successful"
                );
                return Ok(reports);
            }
            PassOutcome::Incomplete(reports) => {
                let incomplete: Vec<&str> =
                    reports.iter().flat_map(|r| r.incomplete_jobs()).collect();
                warn!(
                    pass,
                    ?incomplete,
                    retry_in_s = config.interval.as_secs(),
                    "Jobs not yet complete, waiting for next poll"
                );
                last_reports = reports;
            }
        }
    }
}

/// Runs every validator once, in order, stopping at the first error.
async fn evaluate<V: Validator>(validators: &[V]) -> Result<PassOutcome, PollError> {
    let mut reports = Vec::with_capacity(validators.len());

    for validator in validators {
        debug!(validator = validator.name(), "Running validator");
        match validator.validate().await {
            Ok(report) => {
                info!(validator = validator.name(), "{}", report.detail());
                reports.push(report);
            }
            Err(ValidateError::JobsFailed(report)) => {
                reports.push(report);
                return Err(PollError::JobsFailed {
                    validator: validator.name().to_string(),
                    reports,
                });
            }
            Err(ValidateError::Fetch(source)) => {
                return Err(PollError::Validation {
                    validator: validator.name().to_string(),
                    source,
                    last_reports: Vec::new(),
                });
            }
        }
    }

    if reports.iter().all(|r| r.succeeded) {
        Ok(PassOutcome::Complete(reports))
    } else {
        Ok(PassOutcome::Incomplete(reports))
    }
}
