//! The validator capability and the status validator.
//!
//! A validator runs one evaluation pass: fetch, reconcile, aggregate. It
//! returns the report when no counted job has failed (whether or not every
//! job is done yet) and `ValidateError::JobsFailed` as soon as one has.

use std::future::Future;

use thiserror::Error;
use tracing::{debug, instrument};

use super::config::{ReconciliationConfig, ValidatorBuilder};
use super::fetch::{FetchError, fetch_all};
use super::reconcile::reconcile;
use super::report::{AggregatedReport, aggregate};
use super::source::StatusSource;

/// Errors from a single evaluation pass.
#[derive(Debug, Error)]
pub enum ValidateError {
    /// The status data could not be fetched or was malformed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// At least one counted job failed.
    #[error("{0}")]
    JobsFailed(AggregatedReport),
}

impl ValidateError {
    /// The report attached to the error, if the pass got that far.
    pub fn report(&self) -> Option<&AggregatedReport> {
        match self {
            ValidateError::JobsFailed(report) => Some(report),
            ValidateError::Fetch(_) => None,
        }
    }
}

/// One independently evaluated gate condition.
pub trait Validator: Send + Sync {
    /// The validator's name, used in logs and errors.
    fn name(&self) -> &str;

    /// Runs one evaluation pass.
    fn validate(&self) -> impl Future<Output = Result<AggregatedReport, ValidateError>> + Send;
}

impl<V: Validator> Validator for &V {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn validate(&self) -> impl Future<Output = Result<AggregatedReport, ValidateError>> + Send {
        (**self).validate()
    }
}

/// Gates on every other job reported for a revision.
#[derive(Debug, Clone)]
pub struct StatusValidator<S> {
    source: S,
    config: ReconciliationConfig,
}

impl<S> StatusValidator<S> {
    /// Starts a builder; see `ValidatorBuilder` for the option semantics.
    pub fn builder() -> ValidatorBuilder<S> {
        ValidatorBuilder::new()
    }

    pub(crate) fn new(source: S, config: ReconciliationConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &ReconciliationConfig {
        &self.config
    }
}

impl<S: StatusSource> StatusValidator<S> {
    #[instrument(skip(self), fields(repo = %self.config.repo, git_ref = %self.config.git_ref))]
    async fn run_pass(&self) -> Result<AggregatedReport, ValidateError> {
        let fetched = fetch_all(&self.source, &self.config.repo, &self.config.git_ref).await?;
        let outcomes = reconcile(&fetched, self.config.identity)?;
        let report = aggregate(&outcomes, &self.config.exclusion);

        debug!(
            jobs = outcomes.len(),
            total = report.total_jobs.len(),
            complete = report.complete_jobs.len(),
            failed = report.failed_jobs.len(),
            succeeded = report.succeeded,
            "Evaluated job statuses"
        );

        if report.has_failures() {
            return Err(ValidateError::JobsFailed(report));
        }
        Ok(report)
    }
}

impl<S: StatusSource> Validator for StatusValidator<S> {
    /// The self job name.
    fn name(&self) -> &str {
        &self.config.exclusion.self_job
    }

    fn validate(&self) -> impl Future<Output = Result<AggregatedReport, ValidateError>> + Send {
        self.run_pass()
    }
}
