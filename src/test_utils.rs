//! Shared test doubles and arbitrary generators for property-based testing.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use proptest::prelude::*;

use crate::github::{ApiRequest, ApiResponse, GitHubApiError, Transport};
use crate::status::{
    AggregatedReport, CheckRunEntry, FetchError, Page, PageRequest, StatusEntry, StatusSource,
    ValidateError, Validator,
};
use crate::types::{GitRef, JobOutcome, JobState, RepoId};

// ─── Transport ────────────────────────────────────────────────────────────────

type Scripted = Result<ApiResponse, &'static str>;

/// A transport that replays canned responses.
///
/// `Err(msg)` entries become transport errors. Once the script runs out the
/// repeating entry (if any) is returned forever.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    repeat: Option<Scripted>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Scripted>) -> Self {
        ScriptedTransport {
            script: Mutex::new(script.into()),
            ..Default::default()
        }
    }

    pub fn repeating(response: Scripted) -> Self {
        ScriptedTransport {
            repeat: Some(response),
            ..Default::default()
        }
    }

    /// Number of requests sent so far.
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self) -> Scripted {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| self.repeat.clone())
            .unwrap_or(Err("script exhausted"))
    }
}

impl Transport for ScriptedTransport {
    fn send(
        &self,
        request: &ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, GitHubApiError>> + Send {
        self.requests.lock().unwrap().push(request.clone());
        let result = self
            .next()
            .map_err(GitHubApiError::transport_without_source);
        std::future::ready(result)
    }
}

// ─── Status source ────────────────────────────────────────────────────────────

/// An in-memory status source that pages its entries like the API does.
#[derive(Debug, Default)]
pub struct FakeStatusSource {
    statuses: Vec<StatusEntry>,
    check_runs: Vec<CheckRunEntry>,
    combined_status_failure: Option<u16>,
    check_runs_failure: Option<u16>,
    combined_status_calls: AtomicUsize,
    check_run_calls: AtomicUsize,
}

impl FakeStatusSource {
    pub fn new(statuses: Vec<StatusEntry>, check_runs: Vec<CheckRunEntry>) -> Self {
        FakeStatusSource {
            statuses,
            check_runs,
            ..Default::default()
        }
    }

    /// Makes every combined-status request fail with `status`.
    pub fn fail_combined_status(mut self, status: u16) -> Self {
        self.combined_status_failure = Some(status);
        self
    }

    /// Makes every check-run request fail with `status`.
    pub fn fail_check_runs(mut self, status: u16) -> Self {
        self.check_runs_failure = Some(status);
        self
    }

    pub fn combined_status_calls(&self) -> usize {
        self.combined_status_calls.load(Ordering::SeqCst)
    }

    pub fn check_run_calls(&self) -> usize {
        self.check_run_calls.load(Ordering::SeqCst)
    }
}

fn page_of<T: Clone>(
    entries: &[T],
    page: PageRequest,
    failure: Option<u16>,
) -> Result<Page<T>, GitHubApiError> {
    if let Some(status) = failure {
        return Err(GitHubApiError::from_response(
            status,
            r#"{"message":"scripted failure"}"#,
        ));
    }
    let per_page = page.per_page as usize;
    let start = (page.page as usize - 1).saturating_mul(per_page).min(entries.len());
    let end = start.saturating_add(per_page).min(entries.len());
    Ok(Page::new(
        entries[start..end].to_vec(),
        Some(entries.len() as u64),
    ))
}

impl StatusSource for FakeStatusSource {
    fn combined_status(
        &self,
        _repo: &RepoId,
        _git_ref: &GitRef,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<StatusEntry>, GitHubApiError>> + Send {
        self.combined_status_calls.fetch_add(1, Ordering::SeqCst);
        std::future::ready(page_of(&self.statuses, page, self.combined_status_failure))
    }

    fn check_runs(
        &self,
        _repo: &RepoId,
        _git_ref: &GitRef,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<CheckRunEntry>, GitHubApiError>> + Send {
        self.check_run_calls.fetch_add(1, Ordering::SeqCst);
        std::future::ready(page_of(&self.check_runs, page, self.check_runs_failure))
    }
}

/// `n` combined statuses named `job-0` .. `job-{n-1}`, all in `state`.
pub fn numbered_statuses(n: usize, state: &str) -> Vec<StatusEntry> {
    (0..n)
        .map(|i| StatusEntry::new(format!("job-{i}"), state))
        .collect()
}

/// `n` completed check runs named `job-0` .. `job-{n-1}`, all with `conclusion`.
pub fn numbered_check_runs(n: usize, conclusion: &str) -> Vec<CheckRunEntry> {
    (0..n)
        .map(|i| CheckRunEntry::completed(format!("job-{i}"), conclusion))
        .collect()
}

// ─── Validator ────────────────────────────────────────────────────────────────

/// What a `ScriptedValidator` does on one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// One job done, one still running.
    Pending,
    /// Every job done.
    Succeeded,
    /// `ci-test` failed.
    Failed,
    /// A malformed entry.
    FetchFails,
    /// Never returns.
    Hang,
}

/// A validator that follows a script, repeating the last step.
#[derive(Debug)]
pub struct ScriptedValidator {
    name: String,
    steps: Vec<Step>,
    calls: AtomicUsize,
}

impl ScriptedValidator {
    pub fn new(name: &str, steps: Vec<Step>) -> Self {
        assert!(!steps.is_empty(), "script needs at least one step");
        ScriptedValidator {
            name: name.to_string(),
            steps,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn report(total: &[&str], complete: &[&str], failed: &[&str]) -> AggregatedReport {
    let owned = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    AggregatedReport {
        total_jobs: owned(total),
        complete_jobs: owned(complete),
        failed_jobs: owned(failed),
        ignored_jobs: Vec::new(),
        succeeded: failed.is_empty() && total.len() == complete.len(),
    }
}

impl Validator for ScriptedValidator {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> impl Future<Output = Result<AggregatedReport, ValidateError>> + Send {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps[call.min(self.steps.len() - 1)];
        async move {
            match step {
                Step::Pending => Ok(report(&["ci-lint", "ci-test"], &["ci-lint"], &[])),
                Step::Succeeded => Ok(report(&["ci-lint", "ci-test"], &["ci-lint", "ci-test"], &[])),
                Step::Failed => Err(ValidateError::JobsFailed(report(
                    &["ci-lint", "ci-test"],
                    &["ci-lint"],
                    &["ci-test"],
                ))),
                Step::FetchFails => Err(ValidateError::Fetch(FetchError::InvalidCheckRun {
                    name: None,
                    status: None,
                })),
                Step::Hang => std::future::pending().await,
            }
        }
    }
}

// ─── Generators ───────────────────────────────────────────────────────────────

pub fn arb_job_name() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "job-[0-9]".prop_map(String::from),
        1 => Just("self".to_string()),
    ]
}

pub fn arb_job_state() -> impl Strategy<Value = JobState> {
    prop_oneof![
        Just(JobState::Pending),
        Just(JobState::Success),
        Just(JobState::Error),
    ]
}

pub fn arb_job_outcomes() -> impl Strategy<Value = Vec<JobOutcome>> {
    prop::collection::vec(
        (arb_job_name(), arb_job_state()).prop_map(|(name, state)| JobOutcome::new(name, state)),
        0..30,
    )
}

/// A well-formed combined status entry.
pub fn arb_status_entry() -> impl Strategy<Value = StatusEntry> {
    let state = prop::sample::select(vec!["success", "pending", "error", "failure"]);
    (arb_job_name(), state).prop_map(|(name, state)| StatusEntry::new(name, state))
}

/// A well-formed check run, either still running or completed.
pub fn arb_check_run_entry() -> impl Strategy<Value = CheckRunEntry> {
    let conclusion = prop::sample::select(vec![
        "success",
        "neutral",
        "skipped",
        "failure",
        "cancelled",
        "timed_out",
        "action_required",
    ]);
    prop_oneof![
        (arb_job_name(), prop::sample::select(vec!["queued", "in_progress"]))
            .prop_map(|(name, status)| CheckRunEntry::in_progress(name, status)),
        (arb_job_name(), conclusion)
            .prop_map(|(name, conclusion)| CheckRunEntry::completed(name, conclusion)),
    ]
}
