//! Operator interaction - prompts, confirmations and notifications.
//!
//! - `formatter` - styled output helpers
//! - `scripted` - scriptable [OperatorPrompt] for tests and automation
//! - This module - the [OperatorPrompt] seam and its console implementation

use dialoguer::{Confirm, Input};

use crate::error::Result;

pub mod formatter;
pub mod scripted;

pub use formatter::{
    display_error, display_run_summary, display_status, display_success, display_warning,
};
pub use scripted::ScriptedPrompt;

/// Everything the release workflow needs from the human operator.
///
/// Calls block until answered. The workflow never talks to the terminal
/// directly, so it can be driven by [ScriptedPrompt] in tests.
pub trait OperatorPrompt {
    /// Ask a free-form question
    fn ask(&self, question: &str) -> Result<String>;

    /// Ask a yes/no question; `default` is used when the operator just presses Enter
    fn confirm(&self, question: &str, default: bool) -> Result<bool>;

    fn info(&self, message: &str);

    fn warn(&self, message: &str);

    fn error(&self, message: &str);
}

/// Interactive terminal prompt.
///
/// With `accept_defaults` every confirmation resolves to its default without
/// blocking, which is what `--yes` selects.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePrompt {
    accept_defaults: bool,
}

impl ConsolePrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accepting_defaults(accept_defaults: bool) -> Self {
        ConsolePrompt { accept_defaults }
    }
}

impl OperatorPrompt for ConsolePrompt {
    fn ask(&self, question: &str) -> Result<String> {
        let answer: String = Input::new()
            .with_prompt(question)
            .allow_empty(true)
            .interact_text()?;
        Ok(answer)
    }

    fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        if self.accept_defaults {
            display_status(&format!(
                "{} [{}]",
                question,
                if default { "yes" } else { "no" }
            ));
            return Ok(default);
        }

        let answer = Confirm::new()
            .with_prompt(question)
            .default(default)
            .interact()?;
        Ok(answer)
    }

    fn info(&self, message: &str) {
        display_status(message);
    }

    fn warn(&self, message: &str) {
        display_warning(message);
    }

    fn error(&self, message: &str) {
        display_error(message);
    }
}
