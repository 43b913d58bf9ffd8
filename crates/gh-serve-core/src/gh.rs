//! `gh` CLI backed [`Provider`].
//!
//! Every query shells out to `gh` and parses its JSON output. `gh` owns
//! authentication and host selection; nothing here touches credentials.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, ServeError};
use crate::model::{
    ArtifactListing, CommitSummary, PullRequestHead, PullRequestSummary, WorkflowRun,
};
use crate::provider::Provider;

/// Fields requested from `gh run list`.
const RUN_FIELDS: &str = "conclusion,name,status,url,databaseId,headSha,event";

/// Provider that drives the GitHub CLI.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: String,
}

impl Default for GhCli {
    fn default() -> Self {
        GhCli::new("gh")
    }
}

impl GhCli {
    pub fn new(program: impl Into<String>) -> Self {
        GhCli {
            program: program.into(),
        }
    }

    fn display(&self, args: &[&str]) -> String {
        let mut command = self.program.clone();
        for arg in args {
            command.push(' ');
            command.push_str(arg);
        }
        command
    }

    async fn output(&self, args: &[&str]) -> Result<Output> {
        debug!(command = %self.display(args), "running gh");
        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ServeError::query(self.display(args), format!("failed to run: {e}")))
    }

    /// Run `gh` and return stdout, failing on a non-zero exit.
    async fn exec(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args).await?;
        if !output.status.success() {
            return Err(ServeError::query(self.display(args), failure_message(&output)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn exec_json<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T> {
        let stdout = self.exec(args).await?;
        parse_json(&self.display(args), &stdout)
    }
}

fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr
    }
}

fn parse_json<T: DeserializeOwned>(command: &str, text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|source| ServeError::Parse {
        command: command.to_string(),
        source,
    })
}

#[derive(Deserialize)]
struct RepoView {
    #[serde(rename = "nameWithOwner")]
    name_with_owner: String,
}

#[derive(Deserialize)]
struct PullRequestView {
    #[serde(default)]
    commits: Vec<PullRequestCommit>,
    #[serde(rename = "headRefName")]
    head_ref_name: String,
    #[serde(default)]
    closed: bool,
}

#[derive(Deserialize)]
struct PullRequestCommit {
    oid: String,
}

#[derive(Deserialize)]
struct BranchView {
    commit: BranchCommit,
}

#[derive(Deserialize)]
struct BranchCommit {
    sha: String,
}

#[derive(Deserialize)]
struct ArtifactPage {
    #[serde(default)]
    artifacts: Vec<ApiArtifact>,
}

#[derive(Deserialize)]
struct ApiArtifact {
    name: String,
    size_in_bytes: u64,
    expired: bool,
    workflow_run: Option<ApiWorkflowRef>,
}

#[derive(Deserialize)]
struct ApiWorkflowRef {
    id: u64,
}

#[derive(Deserialize)]
struct PullRequestInfo {
    title: String,
    number: u64,
    url: String,
    author: Login,
}

#[derive(Deserialize)]
struct Login {
    login: String,
}

#[derive(Deserialize)]
struct CommitView {
    html_url: String,
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    message: String,
    author: CommitAuthor,
}

#[derive(Deserialize)]
struct CommitAuthor {
    name: String,
    date: String,
}

/// Closed pull requests and ones without commits do not count.
pub(crate) fn pull_request_head(command: &str, text: &str) -> Result<Option<PullRequestHead>> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let view: PullRequestView = parse_json(command, text)?;
    if view.closed {
        return Ok(None);
    }
    Ok(view.commits.last().map(|commit| PullRequestHead {
        branch: view.head_ref_name.clone(),
        sha: commit.oid.clone(),
    }))
}

/// Artifacts without a `workflow_run` reference are attributed to `run_id`.
pub(crate) fn artifact_listings(
    command: &str,
    text: &str,
    run_id: u64,
) -> Result<Vec<ArtifactListing>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let page: ArtifactPage = parse_json(command, text)?;
    Ok(page
        .artifacts
        .into_iter()
        .map(|a| ArtifactListing {
            name: a.name,
            size_bytes: a.size_in_bytes,
            expired: a.expired,
            run_id: a.workflow_run.map(|r| r.id).unwrap_or(run_id),
        })
        .collect())
}

pub(crate) fn commit_summary(command: &str, text: &str) -> Result<CommitSummary> {
    let view: CommitView = parse_json(command, text)?;
    let message = view.commit.message.lines().next().unwrap_or_default().to_string();
    Ok(CommitSummary {
        message,
        author: view.commit.author.name,
        date: view.commit.author.date,
        url: view.html_url,
    })
}

#[async_trait]
impl Provider for GhCli {
    async fn name_with_owner(&self) -> Result<String> {
        let view: RepoView = self
            .exec_json(&["repo", "view", "--json", "nameWithOwner"])
            .await?;
        Ok(view.name_with_owner.trim().to_string())
    }

    async fn open_pull_request(&self) -> Result<Option<PullRequestHead>> {
        let args = ["pr", "view", "--json", "commits,headRefName,closed"];
        let output = self.output(&args).await?;
        if !output.status.success() {
            // gh exits non-zero when the branch has no pull request.
            debug!(reason = %failure_message(&output), "no pull request for current branch");
            return Ok(None);
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        pull_request_head(&self.display(&args), &stdout)
    }

    async fn branch_head(&self, name_with_owner: &str, branch: &str) -> Result<String> {
        let endpoint = format!("repos/{name_with_owner}/branches/{branch}");
        let view: BranchView = self.exec_json(&["api", endpoint.as_str()]).await?;
        Ok(view.commit.sha.trim().to_string())
    }

    async fn list_runs(&self, branch: &str, limit: u32) -> Result<Vec<WorkflowRun>> {
        let limit = limit.to_string();
        self.exec_json(&[
            "run",
            "list",
            "-b",
            branch,
            "-L",
            limit.as_str(),
            "--json",
            RUN_FIELDS,
        ])
        .await
    }

    async fn list_artifacts(
        &self,
        name_with_owner: &str,
        run_id: u64,
    ) -> Result<Vec<ArtifactListing>> {
        let endpoint = format!("repos/{name_with_owner}/actions/runs/{run_id}/artifacts");
        let args = ["api", endpoint.as_str()];
        let stdout = self.exec(&args).await?;
        artifact_listings(&self.display(&args), &stdout, run_id)
    }

    async fn pull_request_summary(&self) -> Result<PullRequestSummary> {
        let info: PullRequestInfo = self
            .exec_json(&["pr", "view", "--json", "url,author,title,number"])
            .await?;
        Ok(PullRequestSummary {
            title: info.title,
            number: info.number,
            author: info.author.login,
            url: info.url,
        })
    }

    async fn commit_summary(&self, name_with_owner: &str, sha: &str) -> Result<CommitSummary> {
        let endpoint = format!("repos/{name_with_owner}/commits/{sha}");
        let args = ["api", endpoint.as_str()];
        let stdout = self.exec(&args).await?;
        commit_summary(&self.display(&args), &stdout)
    }

    async fn download_artifact(&self, run_id: u64, name: &str, dest: &Path) -> Result<()> {
        let run_id = run_id.to_string();
        let dest = dest.to_string_lossy();
        self.exec(&["run", "download", run_id.as_str(), "-n", name, "-D", dest.as_ref()])
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_pull_request_takes_last_commit() {
        let text = r#"{
            "closed": false,
            "headRefName": "feature-x",
            "commits": [{"oid": "111"}, {"oid": "abc123"}]
        }"#;
        let head = pull_request_head("gh pr view", text).unwrap().unwrap();
        assert_eq!(head.branch, "feature-x");
        assert_eq!(head.sha, "abc123");
    }

    #[test]
    fn closed_pull_request_is_ignored() {
        let text = r#"{"closed": true, "headRefName": "old", "commits": [{"oid": "1"}]}"#;
        assert_eq!(pull_request_head("gh pr view", text).unwrap(), None);
    }

    #[test]
    fn pull_request_without_commits_is_ignored() {
        let text = r#"{"closed": false, "headRefName": "empty", "commits": []}"#;
        assert_eq!(pull_request_head("gh pr view", text).unwrap(), None);
    }

    #[test]
    fn malformed_pull_request_view_is_parse_error() {
        let err = pull_request_head("gh pr view", "not json").unwrap_err();
        assert!(matches!(err, ServeError::Parse { .. }));
    }

    #[test]
    fn artifact_listing_reads_workflow_run_id() {
        let text = r#"{
            "total_count": 2,
            "artifacts": [
                {"name": "site", "size_in_bytes": 2048, "expired": false, "workflow_run": {"id": 99}},
                {"name": "old", "size_in_bytes": 1, "expired": true}
            ]
        }"#;
        let listings = artifact_listings("gh api", text, 42).unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].run_id, 99);
        assert_eq!(listings[0].size_bytes, 2048);
        assert_eq!(listings[1].run_id, 42);
        assert!(listings[1].expired);
    }

    #[test]
    fn commit_summary_keeps_first_message_line() {
        let text = r#"{
            "html_url": "https://github.com/o/r/commit/abc123",
            "commit": {
                "message": "Fix docs build\n\nLonger body",
                "author": {"name": "Dana", "date": "2024-03-05T14:07:09Z"}
            }
        }"#;
        let summary = commit_summary("gh api", text).unwrap();
        assert_eq!(summary.message, "Fix docs build");
        assert_eq!(summary.author, "Dana");
        assert_eq!(summary.url, "https://github.com/o/r/commit/abc123");
    }

    #[tokio::test]
    async fn missing_program_is_query_error() {
        let gh = GhCli::new("gh-serve-test-no-such-binary");
        let err = gh.name_with_owner().await.unwrap_err();
        assert!(err.is_query_error());
    }

    #[cfg(unix)]
    mod stub {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::PathBuf;

        /// A `gh` stand-in that appends its arguments to `calls.log` and
        /// then runs `body`.
        struct StubGh {
            dir: tempfile::TempDir,
            gh: GhCli,
        }

        impl StubGh {
            fn new(body: &str) -> Self {
                let dir = tempfile::tempdir().unwrap();
                let log = dir.path().join("calls.log");
                let script = dir.path().join("gh");
                std::fs::write(
                    &script,
                    format!("#!/bin/sh\necho \"$@\" >> '{}'\n{body}\n", log.display()),
                )
                .unwrap();
                std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
                    .unwrap();
                let gh = GhCli::new(script.to_string_lossy());
                StubGh { dir, gh }
            }

            fn calls(&self) -> Vec<String> {
                std::fs::read_to_string(self.dir.path().join("calls.log"))
                    .unwrap_or_default()
                    .lines()
                    .map(str::to_string)
                    .collect()
            }

            fn path(&self, name: &str) -> PathBuf {
                self.dir.path().join(name)
            }
        }

        #[tokio::test]
        async fn pr_view_exit_status_one_means_no_pull_request() {
            let stub = StubGh::new("echo 'no pull requests found for branch \"main\"' >&2\nexit 1");

            let head = stub.gh.open_pull_request().await.unwrap();
            assert_eq!(head, None);
            assert_eq!(stub.calls(), vec!["pr view --json commits,headRefName,closed"]);
        }

        #[tokio::test]
        async fn pr_view_output_gives_head() {
            let stub = StubGh::new(
                r#"echo '{"closed":false,"headRefName":"feature-x","commits":[{"oid":"abc123"}]}'"#,
            );

            let head = stub.gh.open_pull_request().await.unwrap().unwrap();
            assert_eq!(head.branch, "feature-x");
            assert_eq!(head.sha, "abc123");
        }

        #[tokio::test]
        async fn pr_view_garbage_is_parse_error() {
            let stub = StubGh::new("echo 'Showing pull request #12'");

            let err = stub.gh.open_pull_request().await.unwrap_err();
            assert!(matches!(err, ServeError::Parse { .. }));
        }

        #[tokio::test]
        async fn run_list_passes_branch_limit_and_fields() {
            let stub = StubGh::new(
                r#"echo '[{"databaseId":5,"headSha":"abc123","event":"push","status":"completed","conclusion":"success","name":"docs","url":"u"}]'"#,
            );

            let runs = stub.gh.list_runs("feature-x", 20).await.unwrap();
            assert_eq!(runs.len(), 1);
            assert_eq!(runs[0].run_id, 5);
            assert_eq!(
                stub.calls(),
                vec![
                    "run list -b feature-x -L 20 --json \
                     conclusion,name,status,url,databaseId,headSha,event"
                ]
            );
        }

        #[tokio::test]
        async fn branch_head_queries_branch_endpoint() {
            let stub = StubGh::new(r#"echo '{"name":"main","commit":{"sha":"def456"}}'"#);

            let sha = stub.gh.branch_head("octo/site", "main").await.unwrap();
            assert_eq!(sha, "def456");
            assert_eq!(stub.calls(), vec!["api repos/octo/site/branches/main"]);
        }

        #[tokio::test]
        async fn artifact_listing_queries_run_endpoint() {
            let stub = StubGh::new(
                r#"echo '{"artifacts":[{"name":"site","size_in_bytes":10,"expired":false,"workflow_run":{"id":7}}]}'"#,
            );

            let listings = stub.gh.list_artifacts("octo/site", 7).await.unwrap();
            assert_eq!(listings.len(), 1);
            assert_eq!(stub.calls(), vec!["api repos/octo/site/actions/runs/7/artifacts"]);
        }

        #[tokio::test]
        async fn download_passes_run_name_and_destination() {
            let stub = StubGh::new("");
            let dest = stub.path("cache/42/site");

            stub.gh.download_artifact(42, "site", &dest).await.unwrap();
            assert_eq!(
                stub.calls(),
                vec![format!("run download 42 -n site -D {}", dest.display())]
            );
        }

        #[tokio::test]
        async fn failed_command_carries_stderr() {
            let stub = StubGh::new("echo 'HTTP 404: Branch not found' >&2\nexit 1");

            let err = stub.gh.branch_head("octo/site", "gone").await.unwrap_err();
            match err {
                ServeError::Query { command, message } => {
                    assert!(command.ends_with("api repos/octo/site/branches/gone"));
                    assert_eq!(message, "HTTP 404: Branch not found");
                }
                other => panic!("expected Query, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn silent_failure_reports_exit_status() {
            let stub = StubGh::new("exit 3");

            let err = stub.gh.name_with_owner().await.unwrap_err();
            assert!(err.to_string().contains("exit status: 3"));
            assert_eq!(stub.calls(), vec!["repo view --json nameWithOwner"]);
        }
    }
}
