//! The GitHub status client and the octocrab-backed transport it runs on.
//!
//! `GitHubClient` turns status-listing requests into REST calls and decodes
//! the responses. It knows nothing about authentication or retrying; those
//! come from the `Transport` it is given. In production that is an
//! `OctocrabTransport`, usually wrapped in a `RetryTransport`.

use std::future::Future;

use octocrab::Octocrab;
use octocrab::service::middleware::retry::RetryConfig as OctocrabRetryConfig;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::status::{CheckRunEntry, Page, PageRequest, StatusEntry, StatusSource};
use crate::types::{GitRef, RepoId};

use super::error::GitHubApiError;
use super::transport::{ApiRequest, ApiResponse, Transport};

/// The public GitHub API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// A status source backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubClient<T> {
    transport: T,
}

impl<T: Transport> GitHubClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    async fn get_json<B: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: ApiRequest,
    ) -> Result<B, GitHubApiError> {
        let response = self.transport.send(&request).await?;
        trace!(
            request = %request,
            status = response.status,
            bytes = response.body.len(),
            "GitHub response"
        );

        if !response.is_success() {
            return Err(GitHubApiError::from_response(response.status, &response.body));
        }
        serde_json::from_str(&response.body).map_err(|e| GitHubApiError::decode(endpoint, e))
    }
}

/// `GET /repos/{owner}/{repo}/commits/{ref}/{listing}` with paging parameters.
fn commit_listing(repo: &RepoId, git_ref: &GitRef, listing: &str, page: PageRequest) -> ApiRequest {
    let path = format!(
        "/repos/{}/{}/commits/{}/{}",
        urlencoding::encode(&repo.owner),
        urlencoding::encode(&repo.repo),
        urlencoding::encode(git_ref.as_str()),
        listing
    );
    ApiRequest::get(path)
        .query("per_page", page.per_page)
        .query("page", page.page)
}

#[derive(Debug, Deserialize)]
struct CombinedStatusBody {
    #[serde(default)]
    statuses: Vec<StatusEntry>,
    #[serde(default)]
    total_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CheckRunsBody {
    #[serde(default)]
    check_runs: Vec<CheckRunEntry>,
    #[serde(default)]
    total_count: Option<u64>,
}

impl<T: Transport> StatusSource for GitHubClient<T> {
    fn combined_status(
        &self,
        repo: &RepoId,
        git_ref: &GitRef,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<StatusEntry>, GitHubApiError>> + Send {
        let request = commit_listing(repo, git_ref, "status", page);
        async move {
            let body: CombinedStatusBody = self.get_json("combined status", request).await?;
            Ok(Page::new(body.statuses, body.total_count))
        }
    }

    fn check_runs(
        &self,
        repo: &RepoId,
        git_ref: &GitRef,
        page: PageRequest,
    ) -> impl Future<Output = Result<Page<CheckRunEntry>, GitHubApiError>> + Send {
        let request = commit_listing(repo, git_ref, "check-runs", page);
        async move {
            let body: CheckRunsBody = self.get_json("check runs", request).await?;
            Ok(Page::new(body.check_runs, body.total_count))
        }
    }
}

/// A transport that issues authenticated requests through octocrab.
///
/// Octocrab's own retry layer is disabled; retrying is `RetryTransport`'s job.
/// Requests are sent as absolute URIs under `base_url` so that an API root
/// with a path prefix (GitHub Enterprise) is honoured.
#[derive(Clone)]
pub struct OctocrabTransport {
    client: Octocrab,
    base_url: String,
}

impl OctocrabTransport {
    /// Creates a transport from a pre-configured Octocrab instance.
    pub fn from_octocrab(client: Octocrab, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Creates a transport authenticated with a personal or workflow token.
    ///
    /// `api_url` is the API root, e.g. `https://api.github.com` or a GitHub
    /// Enterprise `https://ghe.example.com/api/v3`.
    pub fn from_token(
        token: impl Into<String>,
        api_url: &str,
    ) -> Result<Self, GitHubApiError> {
        let token: String = token.into();
        let client = Octocrab::builder()
            .base_uri(api_url.trim_end_matches('/'))
            .map_err(|e| GitHubApiError::transport(format!("invalid API URL {api_url:?}"), e))?
            .personal_token(token)
            .add_retry_config(OctocrabRetryConfig::None)
            .build()
            .map_err(|e| GitHubApiError::transport("failed to build GitHub client", e))?;
        Ok(Self::from_octocrab(client, api_url))
    }
}

impl Transport for OctocrabTransport {
    fn send(
        &self,
        request: &ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, GitHubApiError>> + Send {
        let uri = format!("{}{}", self.base_url, request.path_and_query());
        async move {
            let response = self
                .client
                ._get(uri.as_str())
                .await
                .map_err(|e| GitHubApiError::transport(format!("GET {uri} failed"), e))?;
            let status = response.status().as_u16();
            let body = self
                .client
                .body_to_string(response)
                .await
                .map_err(|e| GitHubApiError::transport(format!("reading body of {uri}"), e))?;
            Ok(ApiResponse { status, body })
        }
    }
}

impl std::fmt::Debug for OctocrabTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabTransport")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::GitHubErrorKind;
    use crate::test_utils::ScriptedTransport;

    fn repo() -> RepoId {
        RepoId::new("test-owner", "test-repo")
    }

    #[test]
    fn listing_paths_encode_the_ref() {
        let req = commit_listing(
            &repo(),
            &GitRef::new("feature/login"),
            "status",
            PageRequest::first(100).next(),
        );
        assert_eq!(
            req.path_and_query(),
            "/repos/test-owner/test-repo/commits/feature%2Flogin/status?per_page=100&page=2"
        );
    }

    #[tokio::test]
    async fn decodes_combined_status_page() {
        let body = r#"{
            "state": "pending",
            "total_count": 2,
            "statuses": [
                {"context": "ci/test", "state": "success", "updated_at": "2024-01-15T12:00:00Z"},
                {"context": "ci/lint", "state": "pending"}
            ]
        }"#;
        let transport = ScriptedTransport::new(vec![Ok(ApiResponse::new(200, body))]);
        let client = GitHubClient::new(&transport);

        let page = client
            .combined_status(&repo(), &GitRef::new("abc123"), PageRequest::first(100))
            .await
            .unwrap();

        assert_eq!(page.total_count, Some(2));
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].context.as_deref(), Some("ci/test"));
        assert!(page.items[0].updated_at.is_some());
        assert_eq!(page.items[1].state.as_deref(), Some("pending"));
        assert_eq!(
            transport.requests()[0].path,
            "/repos/test-owner/test-repo/commits/abc123/status"
        );
    }

    #[tokio::test]
    async fn decodes_check_runs_page() {
        let body = r#"{
            "total_count": 1,
            "check_runs": [
                {"id": 4, "name": "build", "status": "completed", "conclusion": "success"}
            ]
        }"#;
        let transport = ScriptedTransport::new(vec![Ok(ApiResponse::new(200, body))]);
        let client = GitHubClient::new(&transport);

        let page = client
            .check_runs(&repo(), &GitRef::new("main"), PageRequest::first(100))
            .await
            .unwrap();

        assert_eq!(page.items, vec![CheckRunEntry::completed("build", "success")]);
        assert_eq!(
            transport.requests()[0].path,
            "/repos/test-owner/test-repo/commits/main/check-runs"
        );
    }

    #[tokio::test]
    async fn non_success_status_becomes_api_error() {
        let transport = ScriptedTransport::new(vec![Ok(ApiResponse::new(
            422,
            r#"{"message":"No commit found for SHA: nope"}"#,
        ))]);
        let client = GitHubClient::new(&transport);

        let err = client
            .check_runs(&repo(), &GitRef::new("nope"), PageRequest::first(100))
            .await
            .unwrap_err();

        assert_eq!(err.kind, GitHubErrorKind::Permanent);
        assert_eq!(err.status_code, Some(422));
        assert_eq!(err.message, "No commit found for SHA: nope");
    }

    #[tokio::test]
    async fn undecodable_body_is_permanent() {
        let transport = ScriptedTransport::new(vec![Ok(ApiResponse::new(200, "not json"))]);
        let client = GitHubClient::new(&transport);

        let err = client
            .combined_status(&repo(), &GitRef::new("main"), PageRequest::first(100))
            .await
            .unwrap_err();

        assert_eq!(err.kind, GitHubErrorKind::Permanent);
        assert!(err.message.contains("combined status"));
    }

    #[tokio::test]
    async fn transport_errors_pass_through() {
        let transport = ScriptedTransport::new(vec![Err("connection refused")]);
        let client = GitHubClient::new(&transport);

        let err = client
            .combined_status(&repo(), &GitRef::new("main"), PageRequest::first(100))
            .await
            .unwrap_err();

        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn octocrab_transport_rejects_bad_api_url() {
        let err = OctocrabTransport::from_token("token", "not a url").unwrap_err();
        assert!(err.is_transport());
    }
}
