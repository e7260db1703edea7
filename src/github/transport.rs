//! The HTTP capability the status client is built on.
//!
//! A `Transport` issues one GET request and hands back the status code and
//! body. Authentication, TLS and connection pooling belong to the concrete
//! implementation; retry behaviour is layered on top by wrapping one
//! transport in another (see `RetryTransport`).

use std::fmt;
use std::future::Future;

use super::error::GitHubApiError;

/// A GET request against the GitHub REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// Path relative to the API root, starting with `/`.
    pub path: String,

    /// Query parameters, in order.
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        ApiRequest {
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Appends a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Returns the path followed by the encoded query string.
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.path, query)
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GET {}", self.path_and_query())
    }
}

/// A fully read HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        ApiResponse {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Issues a single HTTP request.
///
/// An `Ok` result means the server answered, whatever the status code.
/// `Err` is reserved for failures where no response was received.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: &ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, GitHubApiError>> + Send;
}

impl<T: Transport> Transport for &T {
    fn send(
        &self,
        request: &ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, GitHubApiError>> + Send {
        (**self).send(request)
    }
}
