//! In-memory fakes for the collaborator traits (testing only)
//!
//! `FakeProvider` answers from scripted data and records downloads,
//! `FakeWorkTree` reports a fixed root and branch, and `ScriptedOperator`
//! records announcements and prompts while returning a preset choice.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Result, ServeError};
use crate::model::{
    ArtifactListing, CommitSummary, PullRequestHead, PullRequestSummary, WorkflowRun,
};
use crate::operator::{Choice, Operator};
use crate::provider::{Provider, WorkTree};

/// A completed, successful run with the given id, head sha and event.
pub fn run(run_id: u64, head_sha: &str, event: &str) -> WorkflowRun {
    WorkflowRun {
        run_id,
        name: "build".to_string(),
        status: "completed".to_string(),
        conclusion: "success".to_string(),
        url: format!("https://github.com/octo/site/actions/runs/{run_id}"),
        event: event.to_string(),
        head_sha: head_sha.to_string(),
    }
}

pub fn listing(name: &str, size_bytes: u64, expired: bool, run_id: u64) -> ArtifactListing {
    ArtifactListing {
        name: name.to_string(),
        size_bytes,
        expired,
        run_id,
    }
}

// ---------------------------------------------------------------------------
// FakeProvider
// ---------------------------------------------------------------------------

/// Scripted provider. Downloads write a single `index.html` into the target
/// directory.
#[derive(Debug, Default)]
pub struct FakeProvider {
    name_with_owner: String,
    pull_request: Option<PullRequestHead>,
    pull_request_summary: Option<PullRequestSummary>,
    branch_heads: HashMap<String, String>,
    runs: HashMap<String, Vec<WorkflowRun>>,
    artifacts: HashMap<u64, Vec<ArtifactListing>>,
    failing_artifacts: HashSet<u64>,
    commits: HashMap<String, CommitSummary>,
    fail_download: bool,
    downloads: Mutex<Vec<(u64, String, PathBuf)>>,
}

impl FakeProvider {
    pub fn new(name_with_owner: &str) -> Self {
        FakeProvider {
            name_with_owner: name_with_owner.to_string(),
            ..Self::default()
        }
    }

    pub fn with_pull_request(mut self, head: PullRequestHead) -> Self {
        self.pull_request = Some(head);
        self
    }

    pub fn with_pull_request_summary(mut self, summary: PullRequestSummary) -> Self {
        self.pull_request_summary = Some(summary);
        self
    }

    pub fn with_branch_head(mut self, branch: &str, sha: &str) -> Self {
        self.branch_heads
            .insert(branch.to_string(), sha.to_string());
        self
    }

    pub fn with_runs(mut self, branch: &str, runs: Vec<WorkflowRun>) -> Self {
        self.runs.insert(branch.to_string(), runs);
        self
    }

    pub fn with_artifacts(mut self, run_id: u64, listings: Vec<ArtifactListing>) -> Self {
        self.artifacts.insert(run_id, listings);
        self
    }

    /// Make artifact listing for `run_id` fail.
    pub fn with_failing_artifacts(mut self, run_id: u64) -> Self {
        self.failing_artifacts.insert(run_id);
        self
    }

    pub fn with_commit_summary(mut self, sha: &str, summary: CommitSummary) -> Self {
        self.commits.insert(sha.to_string(), summary);
        self
    }

    pub fn with_failing_download(mut self) -> Self {
        self.fail_download = true;
        self
    }

    /// Number of `download_artifact` calls so far.
    pub fn download_count(&self) -> usize {
        self.downloads.lock().unwrap().len()
    }

    /// `(run id, artifact name, destination)` of every download so far.
    pub fn downloads(&self) -> Vec<(u64, String, PathBuf)> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for FakeProvider {
    async fn name_with_owner(&self) -> Result<String> {
        Ok(self.name_with_owner.clone())
    }

    async fn open_pull_request(&self) -> Result<Option<PullRequestHead>> {
        Ok(self.pull_request.clone())
    }

    async fn branch_head(&self, name_with_owner: &str, branch: &str) -> Result<String> {
        self.branch_heads.get(branch).cloned().ok_or_else(|| {
            ServeError::query(
                format!("gh api repos/{name_with_owner}/branches/{branch}"),
                "HTTP 404: Branch not found",
            )
        })
    }

    async fn list_runs(&self, branch: &str, limit: u32) -> Result<Vec<WorkflowRun>> {
        Ok(self
            .runs
            .get(branch)
            .map(|runs| runs.iter().take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn list_artifacts(
        &self,
        name_with_owner: &str,
        run_id: u64,
    ) -> Result<Vec<ArtifactListing>> {
        if self.failing_artifacts.contains(&run_id) {
            return Err(ServeError::query(
                format!("gh api repos/{name_with_owner}/actions/runs/{run_id}/artifacts"),
                "HTTP 502: Bad Gateway",
            ));
        }
        Ok(self.artifacts.get(&run_id).cloned().unwrap_or_default())
    }

    async fn pull_request_summary(&self) -> Result<PullRequestSummary> {
        match (&self.pull_request_summary, &self.pull_request) {
            (Some(summary), _) => Ok(summary.clone()),
            (None, Some(head)) => Ok(PullRequestSummary {
                title: format!("Changes from {}", head.branch),
                number: 1,
                author: "test-user".to_string(),
                url: format!("https://github.com/{}/pull/1", self.name_with_owner),
            }),
            (None, None) => Err(ServeError::query(
                "gh pr view",
                "no pull requests found for branch",
            )),
        }
    }

    async fn commit_summary(&self, name_with_owner: &str, sha: &str) -> Result<CommitSummary> {
        Ok(self.commits.get(sha).cloned().unwrap_or_else(|| CommitSummary {
            message: format!("Commit {sha}"),
            author: "test-user".to_string(),
            date: "2024-01-01T00:00:00Z".to_string(),
            url: format!("https://github.com/{name_with_owner}/commit/{sha}"),
        }))
    }

    async fn download_artifact(&self, run_id: u64, name: &str, dest: &Path) -> Result<()> {
        self.downloads
            .lock()
            .unwrap()
            .push((run_id, name.to_string(), dest.to_path_buf()));
        if self.fail_download {
            std::fs::create_dir_all(dest).ok();
            return Err(ServeError::query(
                format!("gh run download {run_id} -n {name}"),
                "no artifact matches any of the names provided",
            ));
        }
        std::fs::create_dir_all(dest).map_err(|e| ServeError::cache(dest, e))?;
        std::fs::write(dest.join("index.html"), format!("<h1>{name}</h1>"))
            .map_err(|e| ServeError::cache(dest, e))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeWorkTree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FakeWorkTree {
    root: PathBuf,
    branch: String,
}

impl FakeWorkTree {
    /// An empty `branch` models a detached HEAD.
    pub fn new(root: impl Into<PathBuf>, branch: &str) -> Self {
        FakeWorkTree {
            root: root.into(),
            branch: branch.to_string(),
        }
    }
}

impl WorkTree for FakeWorkTree {
    fn toplevel(&self) -> Result<PathBuf> {
        Ok(self.root.clone())
    }

    fn current_branch(&self) -> Result<String> {
        Ok(self.branch.clone())
    }
}

// ---------------------------------------------------------------------------
// ScriptedOperator
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ScriptedOperator {
    choice: Option<usize>,
    announcements: Mutex<Vec<String>>,
    prompts: Mutex<Vec<Vec<Choice>>>,
}

impl ScriptedOperator {
    /// Operator that always picks `index`.
    pub fn choosing(index: usize) -> Self {
        ScriptedOperator {
            choice: Some(index),
            ..Self::default()
        }
    }

    /// Operator that cancels every prompt.
    pub fn cancelling() -> Self {
        Self::default()
    }

    pub fn announcements(&self) -> Vec<String> {
        self.announcements.lock().unwrap().clone()
    }

    /// Choices offered in each prompt so far.
    pub fn prompts(&self) -> Vec<Vec<Choice>> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Operator for ScriptedOperator {
    fn announce(&self, line: &str) {
        self.announcements.lock().unwrap().push(line.to_string());
    }

    fn choose(&self, _prompt: &str, choices: &[Choice]) -> Result<usize> {
        self.prompts.lock().unwrap().push(choices.to_vec());
        self.choice.ok_or(ServeError::SelectionAborted)
    }
}
