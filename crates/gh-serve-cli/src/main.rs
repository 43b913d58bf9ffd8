//! gh-serve: preview the CI artifact built for the current branch.
//!
//! Finds the open pull request (or the remote head) of the checked-out
//! branch, picks the workflow artifact built from it, caches it under
//! `.cache/gh-serve` in the repository and serves it over HTTP.

mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use gh_serve_core::config::{DEFAULT_PORT, DEFAULT_RUN_LIMIT};
use gh_serve_core::{init_tracing, resolve, GhCli, GitWorkTree, Operator, ServeConfig};
use gh_serve_preview::{find_index, open_browser, PreviewServer};
use std::path::Path;
use tracing::{info, Level};

use crate::terminal::TerminalOperator;

#[derive(Parser, Debug)]
#[command(name = "gh-serve")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Serve the CI artifact of the current branch or pull request", long_about = None)]
struct Cli {
    /// Port to serve on
    #[arg(long, default_value = DEFAULT_PORT, env = "GH_SERVE_PORT")]
    port: String,

    /// Don't open browser
    #[arg(long)]
    no_browser: bool,

    /// Don't use artifact cache
    #[arg(long)]
    no_cache: bool,

    /// Number of recent workflow runs of the branch to inspect
    #[arg(long, default_value_t = DEFAULT_RUN_LIMIT)]
    run_limit: u32,

    /// GitHub CLI executable
    #[arg(long, default_value = "gh", env = "GH_SERVE_GH")]
    gh: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn config(&self) -> ServeConfig {
        ServeConfig {
            port: self.port.clone(),
            no_browser: self.no_browser,
            no_cache: self.no_cache,
            run_limit: self.run_limit,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let config = cli.config();
    let provider = GhCli::new(&cli.gh);
    let work_tree = GitWorkTree::current()?;
    let operator = TerminalOperator;

    let resolution = resolve(&config, &provider, &work_tree, &operator).await?;
    preview(&config, &resolution.download.path, &operator).await
}

async fn preview(config: &ServeConfig, root: &Path, operator: &dyn Operator) -> Result<()> {
    let index = find_index(root)
        .with_context(|| format!("Failed to scan {} for an index page", root.display()))?;
    let url = config.preview_url(&index);
    operator.announce(&url);

    let server = PreviewServer::bind(&config.bind_addr(), root).await?;
    if !config.no_browser {
        open_browser(&url)?;
    }
    info!(root = %root.display(), port = %config.port, "serving");
    server.run().await?;
    Ok(())
}
