//! Draining paginated status listings.
//!
//! Both listings are requested 100 entries at a time, starting at page 1,
//! until a page comes back shorter than the page size. Pages are
//! concatenated in arrival order so the newest-first ordering of the source
//! is preserved for de-duplication.

use std::future::Future;

use thiserror::Error;
use tracing::{debug, trace};

use crate::github::GitHubApiError;
use crate::types::{GitRef, RepoId};

use super::source::{CheckRunEntry, Page, PageRequest, StatusEntry, StatusSource};

/// Page size for both listings (the API maximum).
pub const PER_PAGE: u32 = 100;

/// Upper bound on pages fetched from one listing.
///
/// A well-behaved source ends with a short page long before this; hitting the
/// cap means the source keeps returning full pages.
pub const MAX_PAGES: u32 = 1000;

/// Errors from fetching or validating status data.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The API call failed.
    #[error("failed to list {listing}: {source}")]
    Api {
        listing: &'static str,
        #[source]
        source: GitHubApiError,
    },

    /// The listing never returned a short page.
    #[error("{listing} listing exceeded {max_pages} pages of {per_page} entries")]
    TooManyPages {
        listing: &'static str,
        max_pages: u32,
        per_page: u32,
    },

    /// A combined status entry is missing its context or state.
    #[error("github combined status response is invalid: context: {context:?}, state: {state:?}")]
    InvalidCombinedStatus {
        context: Option<String>,
        state: Option<String>,
    },

    /// A check run entry is missing its name or status.
    #[error("github check run response is invalid: name: {name:?}, status: {status:?}")]
    InvalidCheckRun {
        name: Option<String>,
        status: Option<String>,
    },
}

/// Everything both listings returned for one revision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedStatuses {
    pub statuses: Vec<StatusEntry>,
    pub check_runs: Vec<CheckRunEntry>,
}

/// Fetches every page of both listings, combined statuses first.
pub async fn fetch_all<S: StatusSource>(
    source: &S,
    repo: &RepoId,
    git_ref: &GitRef,
) -> Result<FetchedStatuses, FetchError> {
    let statuses = drain_pages("combined status", PER_PAGE, move |page| {
        source.combined_status(repo, git_ref, page)
    })
    .await?;

    let check_runs = drain_pages("check runs", PER_PAGE, move |page| {
        source.check_runs(repo, git_ref, page)
    })
    .await?;

    debug!(
        repo = %repo,
        git_ref = %git_ref,
        statuses = statuses.len(),
        check_runs = check_runs.len(),
        "Fetched job statuses"
    );

    Ok(FetchedStatuses {
        statuses,
        check_runs,
    })
}

/// Requests pages 1, 2, ... until one is shorter than `per_page`.
///
/// # Arguments
///
/// * `listing` - Name used in logs and errors
/// * `per_page` - Page size to request; a shorter page ends the listing
/// * `fetch_page` - Fetches a single page. Called once per page, in order.
pub async fn drain_pages<T, F, Fut>(
    listing: &'static str,
    per_page: u32,
    mut fetch_page: F,
) -> Result<Vec<T>, FetchError>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page<T>, GitHubApiError>>,
{
    let mut all = Vec::new();
    let mut request = PageRequest::first(per_page);

    loop {
        if request.page > MAX_PAGES {
            return Err(FetchError::TooManyPages {
                listing,
                max_pages: MAX_PAGES,
                per_page,
            });
        }

        let page = fetch_page(request)
            .await
            .map_err(|source| FetchError::Api { listing, source })?;

        let received = page.items.len();
        trace!(
            listing,
            page = request.page,
            received,
            total_count = ?page.total_count,
            "Fetched page"
        );
        all.extend(page.items);

        if received < per_page as usize {
            return Ok(all);
        }
        request = request.next();
    }
}
