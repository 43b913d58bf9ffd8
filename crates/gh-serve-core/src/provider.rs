//! Collaborator seams: the CI/VCS provider and the local work tree.
//!
//! The pipeline only talks to these traits. [`crate::gh::GhCli`] and
//! [`crate::git::GitWorkTree`] back them with subprocesses; the
//! [`crate::fakes`] module provides scripted in-memory versions for tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::{
    ArtifactListing, CommitSummary, PullRequestHead, PullRequestSummary, WorkflowRun,
};

/// Queries against the CI provider (GitHub, through `gh`).
#[async_trait]
pub trait Provider: Send + Sync {
    /// `owner/name` of the repository the work tree belongs to.
    async fn name_with_owner(&self) -> Result<String>;

    /// Open pull request for the current local branch, if any.
    async fn open_pull_request(&self) -> Result<Option<PullRequestHead>>;

    /// Head commit of `branch` on the remote.
    async fn branch_head(&self, name_with_owner: &str, branch: &str) -> Result<String>;

    /// Recent workflow runs for `branch`, newest first, unfiltered.
    async fn list_runs(&self, branch: &str, limit: u32) -> Result<Vec<WorkflowRun>>;

    /// Artifacts uploaded by a single run, expired ones included.
    async fn list_artifacts(
        &self,
        name_with_owner: &str,
        run_id: u64,
    ) -> Result<Vec<ArtifactListing>>;

    /// Title, number and author of the current branch's pull request.
    async fn pull_request_summary(&self) -> Result<PullRequestSummary>;

    async fn commit_summary(&self, name_with_owner: &str, sha: &str) -> Result<CommitSummary>;

    /// Download and unpack one artifact into `dest`.
    async fn download_artifact(&self, run_id: u64, name: &str, dest: &Path) -> Result<()>;
}

/// The local version-control working tree.
pub trait WorkTree: Send + Sync {
    /// Absolute path of the repository root.
    fn toplevel(&self) -> Result<PathBuf>;

    /// Name of the checked-out branch; empty when HEAD is detached.
    fn current_branch(&self) -> Result<String>;
}
