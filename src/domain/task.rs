use crate::error::{ReleaseError, Result};
use std::fmt;

/// Issue-tracker task number used to annotate merge and commit messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskNumber(String);

impl TaskNumber {
    /// Validate operator input: only ASCII digits are accepted
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(ReleaseError::invalid_input(
                "Invalid task number. Only numeric is allowed.",
            ));
        }
        Ok(TaskNumber(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reference prefix for messages, e.g. `refs #1234`
    pub fn reference(&self) -> String {
        format!("refs #{}", self.0)
    }
}

impl fmt::Display for TaskNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
