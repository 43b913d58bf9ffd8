//! Artifact aggregation across runs and selection of a single artifact.

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{Result, ServeError};
use crate::model::{Artifact, CommitTarget, RepositoryContext, WorkflowRun};
use crate::operator::{Choice, Operator};
use crate::provider::Provider;

const SIZE_UNITS: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];

/// Human-readable size with SI units, e.g. `1.5 kB`, `83 MB`.
pub fn humanize_bytes(bytes: u64) -> String {
    if bytes < 10 {
        return format!("{bytes} B");
    }
    let mut exp = 0;
    let mut scale = 1u64;
    while exp + 1 < SIZE_UNITS.len() && bytes / scale >= 1000 {
        scale *= 1000;
        exp += 1;
    }
    let value = ((bytes as f64 / scale as f64) * 10.0 + 0.5).floor() / 10.0;
    if value < 10.0 {
        format!("{value:.1} {}", SIZE_UNITS[exp])
    } else {
        format!("{value:.0} {}", SIZE_UNITS[exp])
    }
}

/// `✅ success`, `❌ <conclusion>` or `🟡 <status>` for a run.
pub fn status_glyph(run: &WorkflowRun) -> String {
    if run.status == "completed" {
        if run.conclusion == "success" {
            format!("✅ {}", run.conclusion)
        } else {
            format!("❌ {}", run.conclusion)
        }
    } else {
        format!("🟡 {}", run.status.replace('_', " "))
    }
}

/// `<run name> [<event>] (<status>) [<size>] <run url>`.
pub fn describe_artifact(artifact: &Artifact) -> String {
    let run = &artifact.owner_run;
    format!(
        "{} [{}] ({}) [{}] {}",
        run.name,
        run.event,
        status_glyph(run),
        humanize_bytes(artifact.size_bytes),
        run.url
    )
}

/// Gather the unexpired artifacts of every run, in run order.
///
/// A run whose artifact listing fails contributes nothing; the remaining
/// runs are still queried.
pub async fn collect_artifacts(
    ctx: &RepositoryContext,
    runs: Vec<WorkflowRun>,
    provider: &dyn Provider,
) -> Vec<Artifact> {
    let mut candidates = Vec::new();
    for run in runs {
        let run = Arc::new(run);
        match provider.list_artifacts(&ctx.name_with_owner, run.run_id).await {
            Ok(listings) => candidates.extend(
                listings
                    .into_iter()
                    .filter(|listing| !listing.expired)
                    .map(|listing| Artifact::from_listing(listing, Arc::clone(&run))),
            ),
            Err(e) => {
                warn!(run_id = run.run_id, error = %e, "skipping run, artifact listing failed");
            }
        }
    }
    candidates
}

/// Reduce the candidates to one artifact, asking the operator when needed.
pub fn choose_artifact(
    target: &CommitTarget,
    mut candidates: Vec<Artifact>,
    operator: &dyn Operator,
) -> Result<Artifact> {
    match candidates.len() {
        0 => Err(ServeError::NotFound {
            branch: target.branch().to_string(),
            sha: target.sha().to_string(),
        }),
        1 => {
            let artifact = candidates.remove(0);
            info!(artifact = %artifact.name, run_id = artifact.run_id, "single artifact, selected");
            Ok(artifact)
        }
        n => {
            let choices: Vec<Choice> = candidates
                .iter()
                .map(|artifact| Choice {
                    label: artifact.name.clone(),
                    description: describe_artifact(artifact),
                })
                .collect();
            let index = operator.choose("Choose an artifact:", &choices)?;
            if index >= n {
                return Err(ServeError::SelectionAborted);
            }
            Ok(candidates.swap_remove(index))
        }
    }
}

/// Aggregate artifacts over `runs` and resolve them to a single one.
pub async fn select_artifact(
    ctx: &RepositoryContext,
    target: &CommitTarget,
    runs: Vec<WorkflowRun>,
    provider: &dyn Provider,
    operator: &dyn Operator,
) -> Result<Artifact> {
    let candidates = collect_artifacts(ctx, runs, provider).await;
    choose_artifact(target, candidates, operator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{listing, run, FakeProvider, ScriptedOperator};

    fn ctx() -> RepositoryContext {
        RepositoryContext {
            name_with_owner: "octo/site".to_string(),
            cache_root: "/work/site/.cache/gh-serve".into(),
        }
    }

    fn main_at(sha: &str) -> CommitTarget {
        CommitTarget::PlainBranch {
            branch: "main".to_string(),
            sha: sha.to_string(),
        }
    }

    #[test]
    fn humanize_matches_si_units() {
        assert_eq!(humanize_bytes(0), "0 B");
        assert_eq!(humanize_bytes(9), "9 B");
        assert_eq!(humanize_bytes(999), "999 B");
        assert_eq!(humanize_bytes(1000), "1.0 kB");
        assert_eq!(humanize_bytes(1500), "1.5 kB");
        assert_eq!(humanize_bytes(82_854_982), "83 MB");
        assert_eq!(humanize_bytes(3_200_000_000), "3.2 GB");
    }

    #[test]
    fn status_glyphs() {
        let mut r = run(1, "abc", "push");
        r.status = "completed".to_string();
        r.conclusion = "success".to_string();
        assert_eq!(status_glyph(&r), "✅ success");

        r.conclusion = "failure".to_string();
        assert_eq!(status_glyph(&r), "❌ failure");

        r.status = "in_progress".to_string();
        r.conclusion = String::new();
        assert_eq!(status_glyph(&r), "🟡 in progress");
    }

    #[test]
    fn descriptor_lists_run_details() {
        let mut r = run(7, "abc", "push");
        r.name = "docs".to_string();
        r.status = "completed".to_string();
        r.conclusion = "success".to_string();
        r.url = "https://github.com/octo/site/actions/runs/7".to_string();
        let artifact = Artifact::from_listing(listing("site", 1500, false, 7), Arc::new(r));
        assert_eq!(
            describe_artifact(&artifact),
            "docs [push] (✅ success) [1.5 kB] https://github.com/octo/site/actions/runs/7"
        );
    }

    #[tokio::test]
    async fn expired_artifacts_are_dropped() {
        let provider = FakeProvider::new("octo/site").with_artifacts(
            1,
            vec![listing("old", 10, true, 1), listing("site", 20, false, 1)],
        );
        let candidates = collect_artifacts(&ctx(), vec![run(1, "def456", "push")], &provider).await;
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "site");
        assert_eq!(candidates[0].owner_run.run_id, 1);
    }

    #[tokio::test]
    async fn failing_run_does_not_abort_siblings() {
        let provider = FakeProvider::new("octo/site")
            .with_artifacts(1, vec![listing("first", 10, false, 1)])
            .with_failing_artifacts(2)
            .with_artifacts(3, vec![listing("third", 30, false, 3)]);
        let runs = vec![
            run(1, "def456", "push"),
            run(2, "def456", "push"),
            run(3, "def456", "push"),
        ];
        let candidates = collect_artifacts(&ctx(), runs, &provider).await;
        let names: Vec<&str> = candidates.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["first", "third"]);
    }

    #[tokio::test]
    async fn single_candidate_skips_prompt() {
        let provider = FakeProvider::new("octo/site")
            .with_artifacts(1, vec![listing("site", 20, false, 1)]);
        let operator = ScriptedOperator::choosing(0);

        let artifact = select_artifact(
            &ctx(),
            &main_at("def456"),
            vec![run(1, "def456", "push")],
            &provider,
            &operator,
        )
        .await
        .unwrap();
        assert_eq!(artifact.name, "site");
        assert!(operator.prompts().is_empty());
    }

    #[tokio::test]
    async fn no_candidates_is_not_found() {
        let provider = FakeProvider::new("octo/site")
            .with_artifacts(1, vec![listing("old", 20, true, 1)]);
        let operator = ScriptedOperator::choosing(0);

        let err = select_artifact(
            &ctx(),
            &main_at("def456"),
            vec![run(1, "def456", "push")],
            &provider,
            &operator,
        )
        .await
        .unwrap_err();
        match err {
            ServeError::NotFound { branch, sha } => {
                assert_eq!(branch, "main");
                assert_eq!(sha, "def456");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn operator_choice_is_returned() {
        let provider = FakeProvider::new("octo/site").with_artifacts(
            1,
            vec![listing("site", 20, false, 1), listing("coverage", 30, false, 1)],
        );
        let operator = ScriptedOperator::choosing(1);

        let artifact = select_artifact(
            &ctx(),
            &main_at("def456"),
            vec![run(1, "def456", "push")],
            &provider,
            &operator,
        )
        .await
        .unwrap();
        assert_eq!(artifact.name, "coverage");
        let prompts = operator.prompts();
        assert_eq!(prompts.len(), 1);
        let labels: Vec<&str> = prompts[0].iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["site", "coverage"]);
    }

    #[tokio::test]
    async fn cancelled_prompt_aborts() {
        let provider = FakeProvider::new("octo/site").with_artifacts(
            1,
            vec![listing("site", 20, false, 1), listing("coverage", 30, false, 1)],
        );
        let operator = ScriptedOperator::cancelling();

        let err = select_artifact(
            &ctx(),
            &main_at("def456"),
            vec![run(1, "def456", "push")],
            &provider,
            &operator,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServeError::SelectionAborted));
    }

    #[test]
    fn out_of_range_choice_aborts() {
        let r = Arc::new(run(1, "def456", "push"));
        let candidates = vec![
            Artifact::from_listing(listing("a", 1, false, 1), Arc::clone(&r)),
            Artifact::from_listing(listing("b", 1, false, 1), r),
        ];
        let operator = ScriptedOperator::choosing(5);
        let err = choose_artifact(&main_at("def456"), candidates, &operator).unwrap_err();
        assert!(matches!(err, ServeError::SelectionAborted));
    }
}
