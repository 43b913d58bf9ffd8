//! Commit target resolution and the commit summary shown to the operator.

use chrono::DateTime;
use tracing::info;

use crate::error::{Result, ServeError};
use crate::model::{CommitSummary, CommitTarget, PullRequestSummary, RepositoryContext};
use crate::provider::{Provider, WorkTree};

/// Pick the commit to look for artifacts at.
///
/// An open pull request for the current branch wins; otherwise the remote
/// head of the checked-out branch is used.
pub async fn resolve_commit(
    ctx: &RepositoryContext,
    provider: &dyn Provider,
    work_tree: &dyn WorkTree,
) -> Result<CommitTarget> {
    if let Some(head) = provider.open_pull_request().await? {
        info!(branch = %head.branch, sha = %head.sha, "using open pull request");
        return Ok(CommitTarget::PullRequest {
            branch: head.branch,
            sha: head.sha,
        });
    }

    let branch = work_tree.current_branch()?;
    if branch.is_empty() {
        return Err(ServeError::Resolution(
            "no branch is checked out (detached HEAD)".to_string(),
        ));
    }

    let sha = provider.branch_head(&ctx.name_with_owner, &branch).await?;
    if sha.is_empty() {
        return Err(ServeError::Resolution(format!(
            "branch {branch} has no head commit on {}",
            ctx.name_with_owner
        )));
    }

    info!(branch = %branch, sha = %sha, "using branch head");
    Ok(CommitTarget::PlainBranch { branch, sha })
}

/// Render an RFC 3339 timestamp as `Mon Jan 2 15:04:05 2006 -0700`.
pub fn format_commit_date(date: &str) -> Result<String> {
    let parsed = DateTime::parse_from_rfc3339(date)
        .map_err(|e| ServeError::query("commit date", format!("{date:?}: {e}")))?;
    Ok(parsed.format("%a %b %-d %H:%M:%S %Y %z").to_string())
}

fn commit_line(commit: &CommitSummary) -> Result<String> {
    Ok(format!(
        "Commit: {} by {} on {} ({})",
        commit.message,
        commit.author,
        format_commit_date(&commit.date)?,
        commit.url
    ))
}

fn pull_request_line(pr: &PullRequestSummary) -> String {
    format!("PR: {} #{} by {} ({})", pr.title, pr.number, pr.author, pr.url)
}

/// Operator-facing description of the target: branch, PR and head commit.
pub async fn describe_commit(
    ctx: &RepositoryContext,
    target: &CommitTarget,
    provider: &dyn Provider,
) -> Result<Vec<String>> {
    let mut lines = vec![format!(
        "Serving artifact for branch `{}` ({})",
        target.branch(),
        target.sha()
    )];

    if target.is_pull_request() {
        let pr = provider.pull_request_summary().await?;
        lines.push(pull_request_line(&pr));
    }

    let commit = provider
        .commit_summary(&ctx.name_with_owner, target.sha())
        .await?;
    lines.push(commit_line(&commit)?);

    Ok(lines)
}
