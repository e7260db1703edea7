//! Validator configuration and its fail-fast builder.
//!
//! Option setters follow a forgiving convention: an empty value is ignored,
//! and a later setter for the same field replaces an earlier one. Whatever is
//! still missing when `build` runs is reported all at once.

use std::fmt;

use thiserror::Error;

use crate::types::{GitRef, RepoId};

use super::reconcile::IdentityResolution;
use super::report::ExclusionPolicy;
use super::validator::StatusValidator;

/// Immutable settings for one status validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationConfig {
    pub repo: RepoId,
    pub git_ref: GitRef,
    pub exclusion: ExclusionPolicy,
    pub identity: IdentityResolution,
}

/// A single missing configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("repository name is empty")]
    RepositoryEmpty,

    #[error("repository owner is empty")]
    OwnerEmpty,

    #[error("reference of repository is empty")]
    RefEmpty,

    #[error("self job name is empty")]
    SelfJobEmpty,

    #[error("github client is empty")]
    ClientMissing,
}

/// Every configuration problem found by one `build` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ConfigErrors(pub Vec<ConfigError>);

impl ConfigErrors {
    pub fn contains(&self, error: ConfigError) -> bool {
        self.0.contains(&error)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => Ok(()),
            [single] => write!(f, "{single}"),
            all => {
                f.write_str("composite error:")?;
                for e in all {
                    write!(f, "\n\t{e}")?;
                }
                Ok(())
            }
        }
    }
}

/// Builds a `StatusValidator`, collecting every missing field.
#[derive(Debug, Clone)]
pub struct ValidatorBuilder<S> {
    client: Option<S>,
    owner: String,
    repo: String,
    git_ref: String,
    self_job: String,
    ignored: Vec<String>,
    identity: IdentityResolution,
}

impl<S> Default for ValidatorBuilder<S> {
    fn default() -> Self {
        ValidatorBuilder {
            client: None,
            owner: String::new(),
            repo: String::new(),
            git_ref: String::new(),
            self_job: String::new(),
            ignored: Vec::new(),
            identity: IdentityResolution::default(),
        }
    }
}

impl<S> ValidatorBuilder<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status source. `None` leaves any earlier client in place.
    pub fn with_client(mut self, client: Option<S>) -> Self {
        if client.is_some() {
            self.client = client;
        }
        self
    }

    pub fn with_self_job(mut self, name: &str) -> Self {
        if !name.is_empty() {
            self.self_job = name.to_string();
        }
        self
    }

    /// Sets owner and repository; each is applied only if non-empty.
    pub fn with_owner_and_repo(mut self, owner: &str, repo: &str) -> Self {
        if !owner.is_empty() {
            self.owner = owner.to_string();
        }
        if !repo.is_empty() {
            self.repo = repo.to_string();
        }
        self
    }

    pub fn with_ref(mut self, git_ref: &str) -> Self {
        if !git_ref.is_empty() {
            self.git_ref = git_ref.to_string();
        }
        self
    }

    /// Sets the ignored jobs from a comma-separated list.
    ///
    /// Elements are trimmed and empty elements dropped, so `","` yields an
    /// empty list. An empty string leaves the current list untouched.
    pub fn with_ignored_jobs(mut self, csv: &str) -> Self {
        if csv.is_empty() {
            return self;
        }
        self.ignored = csv
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        self
    }

    pub fn with_identity_resolution(mut self, identity: IdentityResolution) -> Self {
        self.identity = identity;
        self
    }

    /// Validates every field and builds the validator.
    pub fn build(self) -> Result<StatusValidator<S>, ConfigErrors> {
        let mut errors = Vec::new();
        if self.repo.is_empty() {
            errors.push(ConfigError::RepositoryEmpty);
        }
        if self.owner.is_empty() {
            errors.push(ConfigError::OwnerEmpty);
        }
        if self.git_ref.is_empty() {
            errors.push(ConfigError::RefEmpty);
        }
        if self.self_job.is_empty() {
            errors.push(ConfigError::SelfJobEmpty);
        }

        match self.client {
            Some(client) if errors.is_empty() => Ok(StatusValidator::new(
                client,
                ReconciliationConfig {
                    repo: RepoId::new(self.owner, self.repo),
                    git_ref: GitRef::new(self.git_ref),
                    exclusion: ExclusionPolicy::new(self.self_job, self.ignored),
                    identity: self.identity,
                },
            )),
            Some(_) => Err(ConfigErrors(errors)),
            None => {
                errors.push(ConfigError::ClientMissing);
                Err(ConfigErrors(errors))
            }
        }
    }
}
