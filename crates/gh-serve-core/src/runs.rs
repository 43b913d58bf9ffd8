//! Workflow run lookup for a commit target.
//!
//! One sha can be built by several events. Inside a pull request the
//! `pull_request` runs are the relevant ones; on a plain branch they are
//! duplicates of the push runs and are dropped.

use tracing::info;

use crate::error::Result;
use crate::model::{CommitTarget, WorkflowRun};
use crate::provider::Provider;

pub const PULL_REQUEST_EVENT: &str = "pull_request";

/// Restrict `runs` to the ones relevant for `target`, keeping their order.
pub fn filter_runs(target: &CommitTarget, runs: Vec<WorkflowRun>) -> Vec<WorkflowRun> {
    let for_sha: Vec<WorkflowRun> = runs
        .into_iter()
        .filter(|run| run.head_sha == target.sha())
        .collect();

    match target {
        CommitTarget::PullRequest { .. } => {
            if for_sha.iter().any(|run| run.event == PULL_REQUEST_EVENT) {
                for_sha
                    .into_iter()
                    .filter(|run| run.event == PULL_REQUEST_EVENT)
                    .collect()
            } else {
                for_sha
            }
        }
        CommitTarget::PlainBranch { .. } => for_sha
            .into_iter()
            .filter(|run| run.event != PULL_REQUEST_EVENT)
            .collect(),
    }
}

/// List the branch's recent runs and keep those built from the target sha.
pub async fn query_runs(
    target: &CommitTarget,
    provider: &dyn Provider,
    limit: u32,
) -> Result<Vec<WorkflowRun>> {
    let listed = provider.list_runs(target.branch(), limit).await?;
    let total = listed.len();
    let runs = filter_runs(target, listed);
    info!(
        branch = %target.branch(),
        sha = %target.sha(),
        listed = total,
        matched = runs.len(),
        "queried workflow runs"
    );
    Ok(runs)
}
