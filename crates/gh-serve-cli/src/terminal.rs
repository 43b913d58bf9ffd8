//! Operator backed by the controlling terminal.

use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use tracing::warn;

use gh_serve_core::{Choice, Operator, Result, ServeError};

/// Prints announcements to stdout and prompts with an arrow-key menu.
pub struct TerminalOperator;

/// Menu line for one choice: label followed by its details.
pub(crate) fn menu_item(choice: &Choice) -> String {
    format!("{}  {}", choice.label, choice.description)
}

impl Operator for TerminalOperator {
    fn announce(&self, line: &str) {
        println!("{line}");
    }

    fn choose(&self, prompt: &str, choices: &[Choice]) -> Result<usize> {
        let items: Vec<String> = choices.iter().map(menu_item).collect();
        let picked = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt.trim_end_matches(':'))
            .items(&items)
            .default(0)
            .interact_opt();

        match picked {
            Ok(Some(index)) => Ok(index),
            Ok(None) => Err(ServeError::SelectionAborted),
            Err(e) => {
                warn!(error = %e, "selection prompt failed");
                Err(ServeError::SelectionAborted)
            }
        }
    }
}
