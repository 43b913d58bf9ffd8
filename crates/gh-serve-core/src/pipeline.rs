//! End-to-end artifact resolution: work tree to cached download.

use tracing::info;

use crate::cache::{ArtifactCache, CachedDownload};
use crate::commit::{describe_commit, resolve_commit};
use crate::config::ServeConfig;
use crate::context::resolve_context;
use crate::error::Result;
use crate::model::{Artifact, CommitTarget, RepositoryContext};
use crate::operator::Operator;
use crate::provider::{Provider, WorkTree};
use crate::runs::query_runs;
use crate::select::{describe_artifact, select_artifact};

/// Everything the preview step needs, produced by [`resolve`].
#[derive(Debug, Clone)]
pub struct Resolution {
    pub context: RepositoryContext,
    pub target: CommitTarget,
    pub artifact: Artifact,
    pub download: CachedDownload,
}

/// Resolve the artifact for the current branch and make sure it is cached.
///
/// Stages run strictly in order. Only per-run artifact listing failures are
/// tolerated; any other error ends the resolution.
pub async fn resolve(
    config: &ServeConfig,
    provider: &dyn Provider,
    work_tree: &dyn WorkTree,
    operator: &dyn Operator,
) -> Result<Resolution> {
    let context = resolve_context(provider, work_tree).await?;
    let target = resolve_commit(&context, provider, work_tree).await?;

    for line in describe_commit(&context, &target, provider).await? {
        operator.announce(&line);
    }

    let runs = query_runs(&target, provider, config.run_limit).await?;
    let artifact = select_artifact(&context, &target, runs, provider, operator).await?;
    operator.announce(&format!(
        "Artifact: {} - {}",
        artifact.name,
        describe_artifact(&artifact)
    ));

    let cache = ArtifactCache::new(&context.cache_root);
    let download = cache.ensure(&artifact, provider, config.no_cache).await?;
    info!(path = %download.path.display(), outcome = ?download.outcome, "artifact ready");

    Ok(Resolution {
        context,
        target,
        artifact,
        download,
    })
}
