//! Data model for the resolution pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Repository identity plus the directory downloads are cached under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryContext {
    /// `owner/name` as reported by the provider.
    pub name_with_owner: String,
    /// `<vcs-root>/.cache/gh-serve`.
    pub cache_root: PathBuf,
}

/// The point in history to find artifacts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitTarget {
    /// Latest commit of the open pull request for the current branch.
    PullRequest { branch: String, sha: String },
    /// Remote head of the current branch.
    PlainBranch { branch: String, sha: String },
}

impl CommitTarget {
    pub fn branch(&self) -> &str {
        match self {
            CommitTarget::PullRequest { branch, .. } | CommitTarget::PlainBranch { branch, .. } => {
                branch
            }
        }
    }

    pub fn sha(&self) -> &str {
        match self {
            CommitTarget::PullRequest { sha, .. } | CommitTarget::PlainBranch { sha, .. } => sha,
        }
    }

    pub fn is_pull_request(&self) -> bool {
        matches!(self, CommitTarget::PullRequest { .. })
    }
}

/// Head of an open pull request for the current branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestHead {
    /// Remote branch name (`headRefName`).
    pub branch: String,
    /// Oid of the most recent commit on the pull request.
    pub sha: String,
}

/// One GitHub Actions workflow run, as listed by `gh run list --json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRun {
    #[serde(rename = "databaseId")]
    pub run_id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub conclusion: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub event: String,
    #[serde(rename = "headSha")]
    pub head_sha: String,
}

/// An artifact entry as returned by the provider for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactListing {
    pub name: String,
    pub size_bytes: u64,
    pub expired: bool,
    pub run_id: u64,
}

/// An uploaded build output, linked to the run that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub size_bytes: u64,
    pub expired: bool,
    pub run_id: u64,
    /// Shared read-only handle to the owning run.
    pub owner_run: Arc<WorkflowRun>,
}

impl Artifact {
    pub fn from_listing(listing: ArtifactListing, owner_run: Arc<WorkflowRun>) -> Self {
        Artifact {
            name: listing.name,
            size_bytes: listing.size_bytes,
            expired: listing.expired,
            run_id: listing.run_id,
            owner_run,
        }
    }
}

/// Pull request details shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSummary {
    pub title: String,
    pub number: u64,
    pub author: String,
    pub url: String,
}

/// Head commit details shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    /// First line of the commit message.
    pub message: String,
    pub author: String,
    /// RFC 3339 timestamp as reported by the provider.
    pub date: String,
    pub url: String,
}
