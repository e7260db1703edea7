//! Newtype wrappers for the identifiers a gate run is scoped to.
//!
//! A run watches exactly one revision of one repository. Keeping the owner,
//! repository and revision in distinct types stops a ref from being passed
//! where a repository name is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A repository identifier (owner/repo format).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        RepoId {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Splits an `owner/repo` slug.
    ///
    /// The first path segment is the owner and everything after the first `/`
    /// is the repository name, so `a/b/c` yields owner `a` and repo `b/c`.
    /// Missing parts come back as empty strings; callers validate them.
    pub fn from_slug(slug: &str) -> Self {
        match slug.split_once('/') {
            Some((owner, repo)) => RepoId::new(owner, repo),
            None => RepoId::new(slug, ""),
        }
    }

    /// Returns true if either half of the identifier is empty.
    pub fn is_incomplete(&self) -> bool {
        self.owner.is_empty() || self.repo.is_empty()
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// A git reference: a commit SHA, a branch name, or a tag name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GitRef(pub String);

impl GitRef {
    pub fn new(s: impl Into<String>) -> Self {
        GitRef(s.into())
    }

    /// Returns the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GitRef {
    fn from(s: &str) -> Self {
        GitRef(s.to_string())
    }
}

impl From<String> for GitRef {
    fn from(s: String) -> Self {
        GitRef(s)
    }
}
