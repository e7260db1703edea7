//! Merging combined statuses and check runs into one outcome per job.
//!
//! # Classification
//!
//! | Source | Entry | Outcome |
//! |--------|-------|---------|
//! | combined status | `state` | `success` / `error` (`failure`) / `pending` |
//! | check run | `status != "completed"` | pending |
//! | check run | conclusion `success` / `neutral` | success |
//! | check run | conclusion `skipped` | dropped entirely |
//! | check run | any other (or missing) conclusion | error |
//!
//! # Identity
//!
//! A job is identified by its name (the status `context` or the check-run
//! `name`). One set of seen names spans both sources, combined statuses
//! first: the first entry for a name wins and later ones are stale. A
//! skipped check run still claims its name.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{JobOutcome, JobState};

use super::fetch::{FetchError, FetchedStatuses};
use super::source::{CheckRunEntry, StatusEntry};

const CHECK_RUN_COMPLETED: &str = "completed";
const CONCLUSION_SUCCESS: &str = "success";
const CONCLUSION_NEUTRAL: &str = "neutral";
const CONCLUSION_SKIPPED: &str = "skipped";

/// How the winning entry is chosen when a job name repeats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityResolution {
    /// Trust the source's newest-first ordering: the first entry wins.
    #[default]
    SourceOrder,

    /// Order each source by its entries' timestamps (newest first, entries
    /// without a timestamp last) before taking the first entry.
    NewestTimestamp,
}

/// How a single check run contributes to the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckRunClass {
    /// Counts as a job in the given state.
    Job(JobState),
    /// Skipped runs do not exist as far as the gate is concerned.
    Skipped,
}

/// Classifies a check run from its `status` and `conclusion`.
pub fn classify_check_run(status: &str, conclusion: Option<&str>) -> CheckRunClass {
    if status != CHECK_RUN_COMPLETED {
        return CheckRunClass::Job(JobState::Pending);
    }
    match conclusion {
        Some(CONCLUSION_SUCCESS) | Some(CONCLUSION_NEUTRAL) => CheckRunClass::Job(JobState::Success),
        Some(CONCLUSION_SKIPPED) => CheckRunClass::Skipped,
        _ => CheckRunClass::Job(JobState::Error),
    }
}

/// Reconciles both listings into de-duplicated job outcomes.
///
/// Every entry is checked for its identity and state fields before any
/// de-duplication happens, so one malformed entry fails the whole pass even
/// if it would have been discarded as stale.
pub fn reconcile(
    fetched: &FetchedStatuses,
    resolution: IdentityResolution,
) -> Result<Vec<JobOutcome>, FetchError> {
    let statuses = validated_statuses(&fetched.statuses)?;
    let check_runs = validated_check_runs(&fetched.check_runs)?;

    let statuses = order_for_resolution(statuses, resolution);
    let check_runs = order_for_resolution(check_runs, resolution);

    let mut seen: HashSet<&str> = HashSet::new();
    let mut outcomes = Vec::with_capacity(statuses.len() + check_runs.len());

    for status in statuses {
        if !seen.insert(status.name) {
            continue;
        }
        outcomes.push(JobOutcome::new(
            status.name,
            JobState::from_status_state(status.state),
        ));
    }

    for run in check_runs {
        if !seen.insert(run.name) {
            continue;
        }
        match classify_check_run(run.state, run.conclusion) {
            CheckRunClass::Job(state) => outcomes.push(JobOutcome::new(run.name, state)),
            CheckRunClass::Skipped => {}
        }
    }

    Ok(outcomes)
}

/// A validated entry from either source, borrowing from the fetched data.
#[derive(Debug, Clone, Copy)]
struct Validated<'a> {
    name: &'a str,
    /// Combined-status state or check-run status.
    state: &'a str,
    conclusion: Option<&'a str>,
    at: Option<DateTime<Utc>>,
}

fn validated_statuses(entries: &[StatusEntry]) -> Result<Vec<Validated<'_>>, FetchError> {
    entries
        .iter()
        .map(|entry| match (&entry.context, &entry.state) {
            (Some(context), Some(state)) => Ok(Validated {
                name: context,
                state,
                conclusion: None,
                at: entry.updated_at,
            }),
            _ => Err(FetchError::InvalidCombinedStatus {
                context: entry.context.clone(),
                state: entry.state.clone(),
            }),
        })
        .collect()
}

fn validated_check_runs(entries: &[CheckRunEntry]) -> Result<Vec<Validated<'_>>, FetchError> {
    entries
        .iter()
        .map(|entry| match (&entry.name, &entry.status) {
            (Some(name), Some(status)) => Ok(Validated {
                name,
                state: status,
                conclusion: entry.conclusion.as_deref(),
                at: entry.last_activity(),
            }),
            _ => Err(FetchError::InvalidCheckRun {
                name: entry.name.clone(),
                status: entry.status.clone(),
            }),
        })
        .collect()
}

fn order_for_resolution(
    mut entries: Vec<Validated<'_>>,
    resolution: IdentityResolution,
) -> Vec<Validated<'_>> {
    if resolution == IdentityResolution::NewestTimestamp {
        // Stable: entries with equal (or no) timestamps keep source order.
        entries.sort_by(|a, b| match (a.at, b.at) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
    }
    entries
}
