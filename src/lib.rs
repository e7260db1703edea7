//! Merge Gatekeeper - hold a pull request until every other CI job on its
//! revision has finished.
//!
//! The library polls a revision's combined statuses and check runs,
//! reconciles them into one outcome per job, leaves out the gate's own job
//! and any ignored jobs, and decides pass or fail under a deadline.

pub mod cli;
pub mod github;
pub mod poll;
pub mod status;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;
