//! The human at the terminal: receives announcements and picks artifacts.

use crate::error::Result;

/// One entry of the selection prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// Short label (the artifact name).
    pub label: String,
    /// Run and size details shown next to the label.
    pub description: String,
}

pub trait Operator: Send + Sync {
    /// Show a line of output to the operator.
    fn announce(&self, line: &str);

    /// Block until the operator picks one of `choices`, returning its index.
    ///
    /// Cancelling the prompt yields [`crate::ServeError::SelectionAborted`].
    fn choose(&self, prompt: &str, choices: &[Choice]) -> Result<usize>;
}
