//! Tracing initialisation for the gh-serve binary.
//!
//! Log lines are written to stderr. Stdout carries only what the operator
//! reads (commit summary, chosen artifact, preview URL), and the selection
//! prompt draws on the terminal between those lines.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Install the stderr subscriber.
///
/// `RUST_LOG` overrides `level`; `json` switches to one JSON object per
/// line. Later calls are no-ops.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let stderr = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let stderr = if json {
        stderr.json().boxed()
    } else {
        stderr.boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr)
        .try_init()
        .ok();
}
