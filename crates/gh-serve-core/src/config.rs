//! Run configuration captured once from the command line.

/// Default HTTP port for the preview server.
pub const DEFAULT_PORT: &str = "8080";

/// Number of recent runs requested per branch (matches `gh run list`).
pub const DEFAULT_RUN_LIMIT: u32 = 20;

/// Immutable settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeConfig {
    /// Port the preview server listens on.
    pub port: String,
    /// Do not open a browser once the URL is known.
    pub no_browser: bool,
    /// Discard any cached copy of the artifact and download it again.
    pub no_cache: bool,
    /// How many recent runs of the branch to inspect.
    pub run_limit: u32,
}

impl Default for ServeConfig {
    fn default() -> Self {
        ServeConfig {
            port: DEFAULT_PORT.to_string(),
            no_browser: false,
            no_cache: false,
            run_limit: DEFAULT_RUN_LIMIT,
        }
    }
}

impl ServeConfig {
    /// Address the preview server binds to.
    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// URL of `index_path` (relative, `/`-separated) on the preview server.
    pub fn preview_url(&self, index_path: &str) -> String {
        format!("http://localhost:{}/{}", self.port, index_path)
    }
}
