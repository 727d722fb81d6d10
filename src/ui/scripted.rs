use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::{ReleaseError, Result};
use crate::ui::OperatorPrompt;

/// Kind of one-way notification the workflow sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Info,
    Warn,
    Error,
}

/// Prompt driven by pre-recorded answers.
///
/// Confirmations take the next scripted answer, or the question's default
/// once the script runs out. Free-form questions must be scripted.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: RefCell<VecDeque<String>>,
    confirmations: RefCell<VecDeque<bool>>,
    questions: RefCell<Vec<String>>,
    messages: RefCell<Vec<(Notice, String)>>,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an answer for the next `ask`
    pub fn answer(self, answer: &str) -> Self {
        self.answers.borrow_mut().push_back(answer.to_string());
        self
    }

    /// Queue a yes/no for the next `confirm`
    pub fn confirm_with(self, answer: bool) -> Self {
        self.confirmations.borrow_mut().push_back(answer);
        self
    }

    /// Every question asked or confirmed, in order
    pub fn questions(&self) -> Vec<String> {
        self.questions.borrow().clone()
    }

    pub fn messages(&self, kind: Notice) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter(|(notice, _)| *notice == kind)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages(Notice::Error)
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages(Notice::Warn)
    }

    pub fn infos(&self) -> Vec<String> {
        self.messages(Notice::Info)
    }

    fn notify(&self, kind: Notice, message: &str) {
        self.messages.borrow_mut().push((kind, message.to_string()));
    }
}

impl OperatorPrompt for ScriptedPrompt {
    fn ask(&self, question: &str) -> Result<String> {
        self.questions.borrow_mut().push(question.to_string());
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| ReleaseError::prompt(format!("no scripted answer for '{}'", question)))
    }

    fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        self.questions.borrow_mut().push(question.to_string());
        Ok(self
            .confirmations
            .borrow_mut()
            .pop_front()
            .unwrap_or(default))
    }

    fn info(&self, message: &str) {
        self.notify(Notice::Info, message);
    }

    fn warn(&self, message: &str) {
        self.notify(Notice::Warn, message);
    }

    fn error(&self, message: &str) {
        self.notify(Notice::Error, message);
    }
}
