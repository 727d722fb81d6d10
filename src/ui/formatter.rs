//! Pure formatting functions for operator output.
//!
//! Display helpers only print; deciding what to show lives in the workflow.

use console::style;

use crate::release::{LibraryResult, RunOutcome, RunReport};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Format and print a warning with a yellow marker.
pub fn display_warning(message: &str) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), message);
}

/// Build the end-of-run summary lines.
pub fn format_run_summary(report: &RunReport) -> Vec<String> {
    let mut lines = Vec::new();

    for library in &report.libraries {
        let line = match &library.result {
            LibraryResult::Released(outcome) => match outcome.published {
                Some(version) => format!(
                    "{}: {} -> {}",
                    library.name, outcome.current_version, version
                ),
                None if outcome.changed => format!(
                    "{}: merged, tag not created (still {})",
                    library.name, outcome.current_version
                ),
                None => format!("{}: unchanged ({})", library.name, outcome.current_version),
            },
            LibraryResult::Failed(reason) => format!("{}: failed - {}", library.name, reason),
        };
        lines.push(line);
    }

    lines.push(match &report.outcome {
        RunOutcome::NoChanges => "No changes detected in libraries, nothing to release.".to_string(),
        RunOutcome::Committed { message } => format!("Committed and pushed: {}", message),
        RunOutcome::CommitDeclined { message } => {
            format!("Manifest updated but not committed: {}", message)
        }
        RunOutcome::Halted { library } => format!("Stopped after failure in {}", library),
    });

    lines
}

/// Print the end-of-run summary.
pub fn display_run_summary(report: &RunReport) {
    println!(
        "\n{}",
        style(format!("Release summary (task #{})", report.task_number)).bold()
    );
    let mut lines = format_run_summary(report);
    let outcome = lines.pop();
    for line in lines {
        println!("  {}", line);
    }
    match (outcome, &report.outcome) {
        (Some(line), RunOutcome::Committed { .. }) => display_success(&line),
        (Some(line), _) => display_status(&line),
        (None, _) => {}
    }
}
