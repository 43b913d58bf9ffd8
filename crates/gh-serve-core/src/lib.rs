//! gh-serve core: resolve the CI artifact for the current branch.
//!
//! The pipeline walks work tree -> commit -> workflow runs -> artifacts ->
//! cached download:
//!
//! 1. [`context::resolve_context`] finds the repository and cache root.
//! 2. [`commit::resolve_commit`] picks the pull request head or branch head.
//! 3. [`runs::query_runs`] lists the runs built from that commit.
//! 4. [`select::select_artifact`] gathers unexpired artifacts and picks one.
//! 5. [`cache::ArtifactCache::ensure`] downloads it unless already cached.
//!
//! [`pipeline::resolve`] chains the stages. Collaborators (`gh`, `git`, the
//! operator at the terminal) sit behind the traits in [`provider`] and
//! [`operator`].

pub mod cache;
pub mod commit;
pub mod config;
pub mod context;
pub mod error;
pub mod fakes;
pub mod gh;
pub mod git;
pub mod model;
pub mod operator;
pub mod pipeline;
pub mod provider;
pub mod runs;
pub mod select;
pub mod telemetry;

pub use cache::{ArtifactCache, CacheOutcome, CachedDownload};
pub use commit::{describe_commit, format_commit_date, resolve_commit};
pub use config::ServeConfig;
pub use context::{cache_root_for, resolve_context, TOOL_NAME};
pub use error::{Result, ServeError};
pub use gh::GhCli;
pub use git::GitWorkTree;
pub use model::{
    Artifact, ArtifactListing, CommitSummary, CommitTarget, PullRequestHead, PullRequestSummary,
    RepositoryContext, WorkflowRun,
};
pub use operator::{Choice, Operator};
pub use pipeline::{resolve, Resolution};
pub use provider::{Provider, WorkTree};
pub use runs::{filter_runs, query_runs};
pub use select::{describe_artifact, humanize_bytes, select_artifact, status_glyph};
pub use telemetry::init_tracing;
