//! Open the preview URL in the operator's browser.

use gh_serve_core::{Result, ServeError};
use tracing::debug;

pub fn open_browser(url: &str) -> Result<()> {
    debug!(url = %url, "opening browser");
    webbrowser::open(url).map_err(|e| ServeError::Server(format!("cannot open browser: {e}")))
}
