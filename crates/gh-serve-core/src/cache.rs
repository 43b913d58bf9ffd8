//! Download cache keyed by `(run id, artifact name)`.
//!
//! Layout: `<cache root>/<run id>/<artifact name>/` holding the unpacked
//! artifact. Entries are never evicted.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Result, ServeError};
use crate::model::Artifact;
use crate::provider::Provider;

/// What [`ArtifactCache::ensure`] had to do to populate the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Entry existed and was reused without a download.
    Hit,
    /// Entry was absent and has been downloaded.
    Fetched,
    /// Entry existed, was deleted because caching is disabled, and was
    /// downloaded again.
    Refreshed,
}

/// A populated cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedDownload {
    pub path: PathBuf,
    pub outcome: CacheOutcome,
}

#[derive(Debug, Clone)]
pub struct ArtifactCache {
    root: PathBuf,
}

impl ArtifactCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ArtifactCache { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic directory for `artifact`.
    pub fn path_for(&self, artifact: &Artifact) -> PathBuf {
        self.root
            .join(artifact.run_id.to_string())
            .join(&artifact.name)
    }

    /// Make sure `artifact` is unpacked in its cache directory.
    ///
    /// With `no_cache` an existing entry is removed and fetched again.
    pub async fn ensure(
        &self,
        artifact: &Artifact,
        provider: &dyn Provider,
        no_cache: bool,
    ) -> Result<CachedDownload> {
        let path = self.path_for(artifact);
        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| ServeError::cache(&path, e))?;

        let outcome = match (exists, no_cache) {
            (true, false) => {
                info!(path = %path.display(), "using cached artifact");
                return Ok(CachedDownload {
                    path,
                    outcome: CacheOutcome::Hit,
                });
            }
            (true, true) => {
                info!(path = %path.display(), "discarding cached artifact");
                tokio::fs::remove_dir_all(&path)
                    .await
                    .map_err(|e| ServeError::cache(&path, e))?;
                CacheOutcome::Refreshed
            }
            (false, _) => CacheOutcome::Fetched,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ServeError::cache(parent, e))?;
        }

        info!(
            artifact = %artifact.name,
            run_id = artifact.run_id,
            path = %path.display(),
            "downloading artifact"
        );
        if let Err(e) = provider
            .download_artifact(artifact.run_id, &artifact.name, &path)
            .await
        {
            // A partial directory would otherwise be served as a cache hit next time.
            if let Err(cleanup) = tokio::fs::remove_dir_all(&path).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %cleanup, "failed to remove partial download");
                }
            }
            return Err(e);
        }

        Ok(CachedDownload { path, outcome })
    }
}
