//! Repository context resolution.

use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::model::RepositoryContext;
use crate::provider::{Provider, WorkTree};

/// Directory name used under `<vcs-root>/.cache`.
pub const TOOL_NAME: &str = "gh-serve";

/// `<vcs_root>/.cache/gh-serve`.
pub fn cache_root_for(vcs_root: &Path) -> std::path::PathBuf {
    vcs_root.join(".cache").join(TOOL_NAME)
}

/// Resolve repository identity and cache root for the current work tree.
pub async fn resolve_context(
    provider: &dyn Provider,
    work_tree: &dyn WorkTree,
) -> Result<RepositoryContext> {
    let vcs_root = work_tree.toplevel()?;
    let name_with_owner = provider.name_with_owner().await?;
    let cache_root = cache_root_for(&vcs_root);
    debug!(repo = %name_with_owner, cache_root = %cache_root.display(), "resolved repository context");
    Ok(RepositoryContext {
        name_with_owner,
        cache_root,
    })
}
