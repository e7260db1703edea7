//! Exponential backoff retry for server-side GitHub failures.
//!
//! `RetryTransport` wraps another `Transport` and re-issues a request when
//! the API answers with a 5xx status:
//!
//! - Up to `max_retries` additional attempts (0 disables retrying)
//! - Delay before retry `n` (0-indexed) is `backoff_base * 2^n`, no jitter
//! - 4xx responses are returned immediately; they are not transient
//! - Transport errors (no HTTP response) are returned immediately unless
//!   `TransportErrorPolicy::Retry` is configured
//!
//! When the budget is exhausted the last 5xx response is handed back to the
//! caller unchanged.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::error::GitHubApiError;
use super::transport::{ApiRequest, ApiResponse, Transport};

/// What to do when a request fails without producing an HTTP response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportErrorPolicy {
    /// Return the error to the caller immediately.
    #[default]
    Fail,

    /// Treat it like a 5xx response and retry with backoff.
    Retry,
}

/// Configuration for exponential backoff retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each subsequent retry.
    pub backoff_base: Duration,

    /// Whether connection-level failures are retried.
    pub transport_errors: TransportErrorPolicy,
}

impl RetryConfig {
    /// Retrying disabled. This is the default.
    pub const DISABLED: Self = Self {
        max_retries: 0,
        backoff_base: Duration::from_secs(1),
        transport_errors: TransportErrorPolicy::Fail,
    };

    /// Creates a new retry configuration that does not retry transport errors.
    pub fn new(max_retries: u32, backoff_base: Duration) -> Self {
        Self {
            max_retries,
            backoff_base,
            transport_errors: TransportErrorPolicy::Fail,
        }
    }

    /// Sets the transport error policy.
    pub fn with_transport_errors(mut self, policy: TransportErrorPolicy) -> Self {
        self.transport_errors = policy;
        self
    }

    /// Computes the delay for the given retry attempt (0-indexed).
    ///
    /// The delay is `backoff_base * 2^attempt`, saturating instead of
    /// overflowing for absurd attempt counts.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.backoff_base.saturating_mul(multiplier)
    }

    /// Returns an iterator over all retry delays.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(|attempt| self.delay_for_attempt(attempt))
    }

    /// Computes the total maximum time spent sleeping across all retries.
    pub fn total_max_wait(&self) -> Duration {
        self.delays().sum()
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DISABLED
    }
}

/// A transport that retries server errors from the transport it wraps.
#[derive(Debug, Clone)]
pub struct RetryTransport<T> {
    inner: T,
    config: RetryConfig,
}

impl<T> RetryTransport<T> {
    pub fn new(inner: T, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

impl<T: Transport> Transport for RetryTransport<T> {
    fn send(
        &self,
        request: &ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, GitHubApiError>> + Send {
        send_with_backoff(&self.inner, self.config, request)
    }
}

/// Sends `request` through `transport`, retrying per `config`.
async fn send_with_backoff<T: Transport>(
    transport: &T,
    config: RetryConfig,
    request: &ApiRequest,
) -> Result<ApiResponse, GitHubApiError> {
    let mut attempt = 0;

    loop {
        let retries_left = attempt < config.max_retries;

        match transport.send(request).await {
            Ok(response) if response.is_server_error() && retries_left => {
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    request = %request,
                    status = response.status,
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying request after server error"
                );
                // Release the discarded body before the next attempt.
                drop(response);
                tokio::time::sleep(delay).await;
            }
            Err(e)
                if e.is_transport()
                    && retries_left
                    && config.transport_errors == TransportErrorPolicy::Retry =>
            {
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    request = %request,
                    error = %e,
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying request after transport error"
                );
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }

        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedTransport;
    use proptest::prelude::*;

    fn request() -> ApiRequest {
        ApiRequest::get("/repos/o/r/commits/abc/status")
    }

    // ─── Unit Tests ───────────────────────────────────────────────────────────

    #[test]
    fn default_config_disables_retry() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.transport_errors, TransportErrorPolicy::Fail);
        assert_eq!(config.total_max_wait(), Duration::ZERO);
    }

    #[test]
    fn delays_double_from_base() {
        let config = RetryConfig::new(4, Duration::from_secs(1));
        let delays: Vec<_> = config.delays().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
            ]
        );
        assert_eq!(config.total_max_wait(), Duration::from_secs(15));
    }

    #[test]
    fn huge_attempt_saturates() {
        let config = RetryConfig::new(1, Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(64), Duration::from_secs(u32::MAX as u64));
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_attempt_does_not_sleep() {
        let inner = ScriptedTransport::new(vec![Ok(ApiResponse::new(200, "{}"))]);
        let transport = RetryTransport::new(&inner, RetryConfig::new(1, Duration::from_secs(1)));

        let start = tokio::time::Instant::now();
        let response = transport.send(&request()).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(inner.calls(), 1);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_return_last_server_error() {
        let base = Duration::from_millis(100);
        let inner = ScriptedTransport::repeating(Ok(ApiResponse::new(503, "Service Unavailable")));
        let transport = RetryTransport::new(&inner, RetryConfig::new(2, base));

        let start = tokio::time::Instant::now();
        let response = transport.send(&request()).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(response.status, 503);
        assert_eq!(inner.calls(), 3); // Initial + 2 retries
        assert!(elapsed >= base * (1 + 2));
    }

    #[tokio::test(start_paused = true)]
    async fn server_error_then_success() {
        let inner = ScriptedTransport::new(vec![
            Ok(ApiResponse::new(502, "")),
            Ok(ApiResponse::new(500, "")),
            Ok(ApiResponse::new(200, "ok")),
        ]);
        let transport = RetryTransport::new(&inner, RetryConfig::new(3, Duration::from_millis(10)));

        let response = transport.send(&request()).await.unwrap();

        assert_eq!(response, ApiResponse::new(200, "ok"));
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn client_error_not_retried() {
        let inner = ScriptedTransport::repeating(Ok(ApiResponse::new(404, "")));
        let transport = RetryTransport::new(&inner, RetryConfig::new(3, Duration::from_millis(10)));

        let response = transport.send(&request()).await.unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_sends_once() {
        let inner = ScriptedTransport::repeating(Ok(ApiResponse::new(503, "")));
        let transport = RetryTransport::new(&inner, RetryConfig::DISABLED);

        let response = transport.send(&request()).await.unwrap();

        assert_eq!(response.status, 503);
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_not_retried_by_default() {
        let inner = ScriptedTransport::repeating(Err("connection refused"));
        let transport = RetryTransport::new(&inner, RetryConfig::new(3, Duration::from_millis(10)));

        let err = transport.send(&request()).await.unwrap_err();

        assert!(err.is_transport());
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_retried_when_configured() {
        let inner = ScriptedTransport::new(vec![
            Err("connection reset"),
            Ok(ApiResponse::new(200, "ok")),
        ]);
        let config = RetryConfig::new(3, Duration::from_millis(10))
            .with_transport_errors(TransportErrorPolicy::Retry);
        let transport = RetryTransport::new(&inner, config);

        let response = transport.send(&request()).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(inner.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn retried_transport_errors_still_respect_budget() {
        let inner = ScriptedTransport::repeating(Err("connection reset"));
        let config = RetryConfig::new(2, Duration::from_millis(10))
            .with_transport_errors(TransportErrorPolicy::Retry);
        let transport = RetryTransport::new(&inner, config);

        let err = transport.send(&request()).await.unwrap_err();

        assert!(err.is_transport());
        assert_eq!(inner.calls(), 3);
    }

    // ─── Property Tests ───────────────────────────────────────────────────────

    proptest! {
        #[test]
        fn first_delay_equals_base(base_ms in 1u64..10_000) {
            let config = RetryConfig::new(5, Duration::from_millis(base_ms));
            prop_assert_eq!(config.delay_for_attempt(0), Duration::from_millis(base_ms));
        }

        #[test]
        fn each_delay_doubles_the_previous(base_ms in 1u64..1000, attempt in 1u32..16) {
            let config = RetryConfig::new(16, Duration::from_millis(base_ms));
            prop_assert_eq!(
                config.delay_for_attempt(attempt),
                config.delay_for_attempt(attempt - 1) * 2
            );
        }

        #[test]
        fn total_wait_is_base_times_two_pow_n_minus_one(base_ms in 1u64..1000, retries in 0u32..16) {
            let config = RetryConfig::new(retries, Duration::from_millis(base_ms));
            let expected = Duration::from_millis(base_ms) * ((1u32 << retries) - 1);
            prop_assert_eq!(config.total_max_wait(), expected);
        }
    }
}
