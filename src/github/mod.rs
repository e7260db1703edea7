//! GitHub REST access for status listings.
//!
//! Layers, from the wire up:
//! - `OctocrabTransport`: authenticated GET requests via octocrab
//! - `RetryTransport`: exponential backoff on 5xx responses
//! - `GitHubClient`: builds the listing requests and decodes pages; this is
//!   the `StatusSource` the validator runs against

mod client;
mod error;
mod retry;
mod transport;

pub use client::{DEFAULT_API_URL, GitHubClient, OctocrabTransport};
pub use error::{GitHubApiError, GitHubErrorKind};
pub use retry::{RetryConfig, RetryTransport, TransportErrorPolicy};
pub use transport::{ApiRequest, ApiResponse, Transport};
