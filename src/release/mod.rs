//! Release workflow: per-library state machine and the run that drives it.
//!
//! A run walks the configured libraries in order. Each library goes through
//! [LibraryReleaser]; the ones that end up tagged are collected in a
//! [ReleaseRun] and, once every library is done, pinned in the primary
//! project's manifest and committed on its release line.

pub mod detector;
pub mod library;
pub mod orchestrator;

pub use detector::ChangeDetector;
pub use library::{LibraryOutcome, LibraryReleaser, ReleaseState};
pub use orchestrator::{Collaborators, ReleaseOrchestrator};

use crate::domain::{SemanticVersion, TaskNumber};

/// How a single library's processing ended
#[derive(Debug, Clone, PartialEq)]
pub enum LibraryResult {
    Released(LibraryOutcome),
    /// Error message reported to the operator
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibraryReport {
    pub name: String,
    pub result: LibraryResult,
}

/// How the whole run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No library was tagged; the primary project was left alone
    NoChanges,
    /// Primary project committed and its release line pushed
    Committed { message: String },
    /// Manifest written, aggregate commit declined by the operator
    CommitDeclined { message: String },
    /// Operator stopped the run after `library` failed
    Halted { library: String },
}

/// State accumulated while a run is in progress
#[derive(Debug, Clone)]
pub struct ReleaseRun {
    pub task_number: TaskNumber,
    /// Cleared when a library fails, set again once the operator chooses to go on
    pub continue_on_error: bool,
    /// Published versions in processing order, only for libraries actually tagged
    pub versions_by_library: Vec<(String, SemanticVersion)>,
    pub libraries: Vec<LibraryReport>,
}

impl ReleaseRun {
    pub fn new(task_number: TaskNumber) -> Self {
        ReleaseRun {
            task_number,
            continue_on_error: true,
            versions_by_library: Vec::new(),
            libraries: Vec::new(),
        }
    }

    /// Record a library that made it through its state machine
    pub fn record_success(&mut self, outcome: LibraryOutcome) {
        if let Some(version) = outcome.published {
            self.versions_by_library
                .push((outcome.library.clone(), version));
        }
        self.continue_on_error = true;
        self.libraries.push(LibraryReport {
            name: outcome.library.clone(),
            result: LibraryResult::Released(outcome),
        });
    }

    /// Record a library whose processing raised an error
    pub fn record_failure(&mut self, library: &str, message: String) {
        self.continue_on_error = false;
        self.libraries.push(LibraryReport {
            name: library.to_string(),
            result: LibraryResult::Failed(message),
        });
    }

    /// Aggregate commit message, e.g. `refs #12 Released * testlib 1.0.01`
    pub fn commit_message(&self) -> String {
        let mut message = format!("{} Released", self.task_number.reference());
        for (library, version) in &self.versions_by_library {
            message.push_str(&format!(" * {} {}", library, version));
        }
        message
    }

    pub fn finish(self, outcome: RunOutcome) -> RunReport {
        RunReport {
            task_number: self.task_number,
            libraries: self.libraries,
            versions_by_library: self.versions_by_library,
            outcome,
        }
    }
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub task_number: TaskNumber,
    pub libraries: Vec<LibraryReport>,
    pub versions_by_library: Vec<(String, SemanticVersion)>,
    pub outcome: RunOutcome,
}

impl RunReport {
    /// Published version of a library, if it was tagged in this run
    pub fn published_version(&self, library: &str) -> Option<SemanticVersion> {
        self.versions_by_library
            .iter()
            .find(|(name, _)| name == library)
            .map(|(_, version)| *version)
    }
}
