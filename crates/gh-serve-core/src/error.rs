//! Error taxonomy for the artifact resolution pipeline.

use std::path::PathBuf;

/// Errors produced while resolving, downloading or serving an artifact.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// A `gh` or `git` invocation failed.
    #[error("`{command}` failed: {message}")]
    Query { command: String, message: String },

    /// A collaborator returned output that could not be parsed.
    #[error("unexpected output from `{command}`: {source}")]
    Parse {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot resolve commit: {0}")]
    Resolution(String),

    #[error("No artifacts found for branch {branch} and sha {sha}")]
    NotFound { branch: String, sha: String },

    #[error("artifact selection aborted")]
    SelectionAborted,

    #[error("cache error at {}: {source}", path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Server(String),
}

impl ServeError {
    pub(crate) fn query(command: impl Into<String>, message: impl Into<String>) -> Self {
        ServeError::Query {
            command: command.into(),
            message: message.into(),
        }
    }

    pub(crate) fn cache(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ServeError::Cache {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from a collaborator call (failed or malformed).
    pub fn is_query_error(&self) -> bool {
        matches!(self, ServeError::Query { .. } | ServeError::Parse { .. })
    }
}

/// Result type for gh-serve operations.
pub type Result<T> = std::result::Result<T, ServeError>;
