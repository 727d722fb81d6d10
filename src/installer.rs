//! Package-manager update run after the manifest is rewritten.

use std::path::PathBuf;
use std::process::Command;
use tracing::{info, instrument};

use crate::error::{ReleaseError, Result};

/// Refreshes the primary project's installed dependencies
pub trait DependencyInstaller {
    /// Run the update and return its combined output
    fn update(&self) -> Result<String>;

    /// Human-readable form of what `update` runs
    fn describe(&self) -> String;
}

/// Runs an external command (e.g. `composer update`) in the project directory
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
}

impl CommandInstaller {
    pub fn new(program: impl Into<String>, args: Vec<String>, working_dir: impl Into<PathBuf>) -> Self {
        CommandInstaller {
            program: program.into(),
            args,
            working_dir: working_dir.into(),
        }
    }

    /// Build from a full command line, the first element being the program
    pub fn from_command_line(command: &[String], working_dir: impl Into<PathBuf>) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| ReleaseError::config("installer command is empty"))?;
        Ok(CommandInstaller::new(program.clone(), args.to_vec(), working_dir))
    }
}

impl DependencyInstaller for CommandInstaller {
    #[instrument(skip(self), fields(command = %self.describe()))]
    fn update(&self) -> Result<String> {
        let start = std::time::Instant::now();
        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .output()
            .map_err(|e| ReleaseError::command(self.describe(), e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Err(ReleaseError::command(
                self.describe(),
                format!(
                    "exit code {}\n{}{}",
                    output.status.code().unwrap_or(-1),
                    stdout,
                    stderr
                ),
            ));
        }

        info!(duration_ms = start.elapsed().as_millis(), "dependency update finished");
        Ok(format!("{}{}", stdout, stderr))
    }

    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
