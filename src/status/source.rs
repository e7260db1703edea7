//! The status-source capability and the raw entries it returns.
//!
//! Entries are kept exactly as the API reported them: every field is
//! optional so that a malformed entry can be detected and rejected by the
//! reconciler rather than silently defaulted during decoding.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::github::GitHubApiError;
use crate::types::{GitRef, RepoId};

/// One entry from the combined status listing (legacy Status API).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub context: Option<String>,
    pub state: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StatusEntry {
    pub fn new(context: impl Into<String>, state: impl Into<String>) -> Self {
        StatusEntry {
            context: Some(context.into()),
            state: Some(state.into()),
            updated_at: None,
        }
    }

    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }
}

/// One entry from the check-run listing (Checks API).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRunEntry {
    pub name: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl CheckRunEntry {
    /// A check run that has not completed yet.
    pub fn in_progress(name: impl Into<String>, status: impl Into<String>) -> Self {
        CheckRunEntry {
            name: Some(name.into()),
            status: Some(status.into()),
            ..Default::default()
        }
    }

    /// A completed check run with the given conclusion.
    pub fn completed(name: impl Into<String>, conclusion: impl Into<String>) -> Self {
        CheckRunEntry {
            name: Some(name.into()),
            status: Some("completed".to_string()),
            conclusion: Some(conclusion.into()),
            ..Default::default()
        }
    }

    pub fn with_completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }

    /// The most recent timestamp the run carries.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.completed_at.or(self.started_at)
    }
}

/// Which page of a listing to fetch (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn first(per_page: u32) -> Self {
        PageRequest { page: 1, per_page }
    }

    pub fn next(self) -> Self {
        PageRequest {
            page: self.page + 1,
            ..self
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,

    /// The count the source reported alongside the page. Only used for
    /// diagnostics; the end of a listing is detected from the page length.
    pub total_count: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: Option<u64>) -> Self {
        Page { items, total_count }
    }
}

/// A source of per-revision job statuses.
///
/// Both listings are expected newest-first.
pub trait StatusSource: Send + Sync {
    /// Lists one page of the combined status for `git_ref`.
    fn combined_status(
        &self,
        repo: &RepoId,
        git_ref: &GitRef,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<StatusEntry>, GitHubApiError>> + Send;

    /// Lists one page of check runs for `git_ref`.
    fn check_runs(
        &self,
        repo: &RepoId,
        git_ref: &GitRef,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<CheckRunEntry>, GitHubApiError>> + Send;
}

impl<S: StatusSource> StatusSource for &S {
    fn combined_status(
        &self,
        repo: &RepoId,
        git_ref: &GitRef,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<StatusEntry>, GitHubApiError>> + Send {
        (**self).combined_status(repo, git_ref, page)
    }

    fn check_runs(
        &self,
        repo: &RepoId,
        git_ref: &GitRef,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<CheckRunEntry>, GitHubApiError>> + Send {
        (**self).check_runs(repo, git_ref, page)
    }
}
