//! GitHub API error types.
//!
//! Errors are categorised so callers can tell what went wrong without parsing
//! messages:
//!
//! - **Transient**: the server answered with a 5xx status. The retrying
//!   transport has already spent its retry budget by the time one of these
//!   reaches the status client.
//! - **Permanent**: any other non-success status (auth failures, 404 for an
//!   unknown ref, validation errors) or a body that could not be decoded.
//! - **Transport**: no HTTP response at all (connection refused, DNS, TLS).

use std::fmt;
use thiserror::Error;

/// The kind of GitHub API error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorKind {
    /// HTTP 5xx from the API.
    Transient,

    /// HTTP 4xx (or any other non-2xx that is not a server error), or an
    /// undecodable response body.
    Permanent,

    /// The request never produced an HTTP response.
    Transport,
}

impl GitHubErrorKind {
    /// Categorises a non-success HTTP status code.
    pub fn from_status(status: u16) -> Self {
        if (500..600).contains(&status) {
            GitHubErrorKind::Transient
        } else {
            GitHubErrorKind::Permanent
        }
    }
}

/// A GitHub API error with categorization.
#[derive(Debug, Error)]
pub struct GitHubApiError {
    /// The kind of error.
    pub kind: GitHubErrorKind,

    /// The HTTP status code, if a response was received.
    pub status_code: Option<u16>,

    /// A human-readable description of the error.
    pub message: String,

    /// The underlying client error, if available.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for GitHubApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "GitHub API error (HTTP {}): {}", code, self.message),
            None => write!(f, "GitHub API error: {}", self.message),
        }
    }
}

impl GitHubApiError {
    /// Creates an error from a non-success HTTP response.
    ///
    /// GitHub error bodies are JSON objects with a `message` field; when the
    /// body has one it is used, otherwise the raw body is kept (truncated).
    pub fn from_response(status: u16, body: &str) -> Self {
        Self {
            kind: GitHubErrorKind::from_status(status),
            status_code: Some(status),
            message: extract_api_message(body),
            source: None,
        }
    }

    /// Creates a transport-level error (no HTTP response was received).
    pub fn transport(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind: GitHubErrorKind::Transport,
            status_code: None,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a transport-level error without an underlying source.
    pub fn transport_without_source(message: impl Into<String>) -> Self {
        Self {
            kind: GitHubErrorKind::Transport,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error for a 2xx response whose body could not be decoded.
    pub fn decode(endpoint: &str, source: serde_json::Error) -> Self {
        Self {
            kind: GitHubErrorKind::Permanent,
            status_code: None,
            message: format!("failed to decode {} response: {}", endpoint, source),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if no HTTP response was received.
    pub fn is_transport(&self) -> bool {
        self.kind == GitHubErrorKind::Transport
    }
}

/// Maximum number of body characters kept in an error message.
const MAX_BODY_IN_MESSAGE: usize = 512;

/// Pulls the `message` field out of a GitHub error body.
fn extract_api_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ApiErrorBody {
        message: Option<String>,
    }

    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody {
            message: Some(message),
        }) => message,
        _ if body.trim().is_empty() => "empty response body".to_string(),
        _ => body.chars().take(MAX_BODY_IN_MESSAGE).collect(),
    }
}
