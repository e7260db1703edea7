//! Command-line surface and settings resolution.
//!
//! ```text
//! merge-gatekeeper validate --token $GITHUB_TOKEN --repo owner/repo --ref $SHA
//! ```
//!
//! `--token` and `--repo` fall back to `GITHUB_TOKEN` and `GITHUB_REPOSITORY`;
//! a value given on the command line wins over the environment.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;

use crate::github::{DEFAULT_API_URL, RetryConfig, TransportErrorPolicy};
use crate::poll::{DEFAULT_INTERVAL_SECS, DEFAULT_TIMEOUT_SECS, PollConfig};
use crate::status::IdentityResolution;
use crate::types::{GitRef, RepoId};

/// Job name the gate reports under unless `--self` says otherwise.
pub const DEFAULT_SELF_JOB: &str = "merge-gatekeeper";

#[derive(Debug, Parser)]
#[command(name = "merge-gatekeeper")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Wait for every other CI job on a revision to finish", long_about = None)]
pub struct Cli {
    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll job statuses until they all succeed, one fails, or the timeout passes
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// GitHub token
    #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Repository as owner/repo
    #[arg(short, long, env = "GITHUB_REPOSITORY")]
    pub repo: String,

    /// Revision to gate: a SHA, branch name or tag name
    #[arg(long = "ref")]
    pub git_ref: String,

    /// Name of the job running this gate; it is never waited on
    #[arg(long = "self", default_value = DEFAULT_SELF_JOB)]
    pub self_job: String,

    /// Comma-separated job names to leave out of the accounting
    #[arg(long, default_value = "")]
    pub ignored: String,

    /// Seconds between polls
    #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS)]
    pub interval: u64,

    /// Seconds before giving up
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Retries for each API request answered with a 5xx status
    #[arg(long, default_value_t = 0)]
    pub retries: u32,

    /// Seconds before the first retry; doubles on each retry
    #[arg(long, default_value_t = 1)]
    pub retry_backoff: u64,

    /// Also retry requests that fail without an HTTP response
    #[arg(long)]
    pub retry_network_errors: bool,

    /// How to pick the authoritative entry when a job name repeats
    #[arg(long, value_enum, default_value_t = Resolution::SourceOrder)]
    pub resolve_by: Resolution,

    /// GitHub API root
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,
}

/// Process exit code for an argument parsing failure.
///
/// `--help` and `--version` surface as clap errors but are not failures.
/// Everything else exits 1, like every other failure of the gate.
pub fn parse_error_exit_code(err: &clap::Error) -> u8 {
    if err.use_stderr() { 1 } else { 0 }
}

/// Command-line spelling of `IdentityResolution`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Resolution {
    /// First entry the API lists wins
    SourceOrder,
    /// Entry with the newest timestamp wins
    NewestTimestamp,
}

impl From<Resolution> for IdentityResolution {
    fn from(r: Resolution) -> Self {
        match r {
            Resolution::SourceOrder => IdentityResolution::SourceOrder,
            Resolution::NewestTimestamp => IdentityResolution::NewestTimestamp,
        }
    }
}

/// Invalid combinations of otherwise well-formed arguments.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("github owner or repository is empty. owner: {owner}, repository: {repo}")]
    InvalidRepository { owner: String, repo: String },

    #[error("--interval must be at least 1 second")]
    ZeroInterval,
}

/// Everything `validate` needs, resolved from the arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateSettings {
    pub repo: RepoId,
    pub git_ref: GitRef,
    pub self_job: String,
    pub ignored: String,
    pub identity: IdentityResolution,
    pub poll: PollConfig,
    pub retry: RetryConfig,
    pub api_url: String,
}

impl ValidateArgs {
    /// Splits the repository slug and builds the typed configuration.
    pub fn resolve(&self) -> Result<ValidateSettings, CliError> {
        let repo = RepoId::from_slug(&self.repo);
        if repo.is_incomplete() {
            return Err(CliError::InvalidRepository {
                owner: repo.owner,
                repo: repo.repo,
            });
        }
        if self.interval == 0 {
            return Err(CliError::ZeroInterval);
        }

        let transport_errors = if self.retry_network_errors {
            TransportErrorPolicy::Retry
        } else {
            TransportErrorPolicy::Fail
        };

        Ok(ValidateSettings {
            repo,
            git_ref: GitRef::new(self.git_ref.clone()),
            self_job: self.self_job.clone(),
            ignored: self.ignored.clone(),
            identity: self.resolve_by.into(),
            poll: PollConfig::new()
                .with_interval(Duration::from_secs(self.interval))
                .with_timeout(Duration::from_secs(self.timeout)),
            retry: RetryConfig::new(self.retries, Duration::from_secs(self.retry_backoff))
                .with_transport_errors(transport_errors),
            api_url: self.api_url.clone(),
        })
    }
}
