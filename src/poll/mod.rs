//! Repeated evaluation under a deadline.
//!
//! `run_until_complete` drives a set of validators: first pass immediately,
//! then one pass per interval until every validator succeeds, one fails, the
//! timeout elapses, or the cancellation token fires.

pub mod config;
pub mod runner;

pub use config::{DEFAULT_INTERVAL_SECS, DEFAULT_TIMEOUT_SECS, PollConfig};
pub use runner::{PollError, run_until_complete};
