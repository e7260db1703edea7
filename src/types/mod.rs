//! Core domain types for the gate.
//!
//! Identifiers scope a run to one revision of one repository; job outcomes are
//! the reconciled per-job view built fresh on every evaluation pass.

pub mod ids;
pub mod job;

// Re-export commonly used types at the module level
pub use ids::{GitRef, RepoId};
pub use job::{JobOutcome, JobState};
