//! Release workflow wiring
//!
//! Resolves configuration and the primary project, builds the real
//! collaborators and hands them to [ReleaseOrchestrator]. Kept apart from
//! clap parsing so the workflow can be called programmatically.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{self, ReleaseConfig, ReleasePlan};
use crate::git::GitProvider;
use crate::installer::{CommandInstaller, DependencyInstaller};
use crate::manifest::JsonManifest;
use crate::release::{Collaborators, ReleaseOrchestrator, RunReport};
use crate::ui::ConsolePrompt;

/// Arguments for the release workflow
///
/// Mirrors the CLI Args without depending on clap.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReleaseWorkflowArgs {
    /// Path to custom config file
    pub config_path: Option<String>,

    /// Task number; asked for interactively when absent
    pub task: Option<String>,

    /// Primary project directory, current directory when absent
    pub project: Option<PathBuf>,

    /// Answer every confirmation with its default
    pub accept_defaults: bool,
}

/// Resolve configuration against the primary project directory
pub fn build_plan(config: &ReleaseConfig, project: Option<&Path>) -> Result<ReleasePlan> {
    let project = match project {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    let primary = std::fs::canonicalize(&project).with_context(|| {
        format!("Primary project not found: {}", project.display())
    })?;

    let plan = config.plan(&primary)?;
    debug!(
        primary = %plan.primary_project.display(),
        libraries = plan.libraries.len(),
        "release plan resolved"
    );
    Ok(plan)
}

/// Main release workflow
///
/// 1. Load configuration and resolve the plan
/// 2. Release every configured library in order
/// 3. Pin the published versions in the primary project and commit them
pub fn run_release_workflow(args: ReleaseWorkflowArgs) -> Result<RunReport> {
    let config = config::load_config(args.config_path.as_deref())
        .context("Error loading config")?;
    let plan = build_plan(&config, args.project.as_deref())?;

    let installer = if config.installer.enabled {
        Some(CommandInstaller::from_command_line(
            &config.installer.command,
            &plan.primary_project,
        )?)
    } else {
        None
    };
    let manifest = JsonManifest::new(config.manifest.section.clone());
    let prompt = ConsolePrompt::accepting_defaults(args.accept_defaults);

    let orchestrator = ReleaseOrchestrator::new(
        &plan,
        Collaborators {
            repositories: &GitProvider,
            manifest: &manifest,
            installer: installer.as_ref().map(|i| i as &dyn DependencyInstaller),
            prompt: &prompt,
        },
    );

    let report = orchestrator.run(args.task.as_deref())?;
    Ok(report)
}
