use tracing::{info, instrument, warn};

use crate::config::{PinStyle, ReleasePlan};
use crate::domain::library::manifest_key;
use crate::domain::{LibraryDescriptor, SemanticVersion, TaskNumber, VersionTag};
use crate::error::{ReleaseError, Result};
use crate::git::{ensure_branch, RepositoryClient, RepositoryProvider};
use crate::installer::DependencyInstaller;
use crate::manifest::ManifestUpdater;
use crate::release::{LibraryReleaser, ReleaseRun, RunOutcome, RunReport};
use crate::ui::OperatorPrompt;
use crate::warning::ReleaseWarning;

/// I/O capabilities a run is driven through
pub struct Collaborators<'a> {
    pub repositories: &'a dyn RepositoryProvider,
    pub manifest: &'a dyn ManifestUpdater,
    /// `None` skips the dependency update
    pub installer: Option<&'a dyn DependencyInstaller>,
    pub prompt: &'a dyn OperatorPrompt,
}

/// Releases every configured library, then updates the primary project
pub struct ReleaseOrchestrator<'a> {
    plan: &'a ReleasePlan,
    tools: Collaborators<'a>,
}

impl<'a> ReleaseOrchestrator<'a> {
    pub fn new(plan: &'a ReleasePlan, tools: Collaborators<'a>) -> Self {
        ReleaseOrchestrator { plan, tools }
    }

    /// Run the whole release.
    ///
    /// `task` is asked for when not given. Per-library failures are reported
    /// and gated behind a continue prompt; an invalid task number or library
    /// path ends the run with an error before anything else happens to that
    /// library.
    #[instrument(skip(self), fields(primary = %self.plan.primary_project.display()))]
    pub fn run(&self, task: Option<&str>) -> Result<RunReport> {
        let prompt = self.tools.prompt;
        let task_number = match task {
            Some(task) => TaskNumber::parse(task)?,
            None => TaskNumber::parse(&prompt.ask("Enter task number:")?)?,
        };

        let mut run = ReleaseRun::new(task_number);
        let releaser = LibraryReleaser::new(&self.plan.branches, prompt);

        for library in &self.plan.libraries {
            let repo = self.open_library(library)?;

            match releaser.release(&library.name, repo.as_ref(), &run.task_number) {
                Ok(outcome) => run.record_success(outcome),
                Err(err) if err.aborts_run() => return Err(err),
                Err(err) => {
                    warn!(library = %library.name, error = %err, "library release failed");
                    prompt.error(&err.to_string());
                    run.record_failure(&library.name, err.to_string());
                }
            }

            if !run.continue_on_error {
                if !prompt.confirm("Do you wish to continue?", true)? {
                    return Ok(run.finish(RunOutcome::Halted {
                        library: library.name.clone(),
                    }));
                }
                run.continue_on_error = true;
            }
        }

        if run.versions_by_library.is_empty() {
            prompt.info("No changes detected in libraries, nothing to release.");
            return Ok(run.finish(RunOutcome::NoChanges));
        }

        let outcome = self.update_primary_project(&run)?;
        Ok(run.finish(outcome))
    }

    fn open_library(&self, library: &LibraryDescriptor) -> Result<Box<dyn RepositoryClient>> {
        let path = library.resolve()?;
        self.tools
            .prompt
            .warn(&format!("Working with path: {}", path.display()));

        self.tools
            .repositories
            .open(&path)
            .map_err(|err| {
                warn!(library = %library.name, error = %err, "not a working copy");
                ReleaseError::InvalidLibraryPath {
                    name: library.name.clone(),
                    path: library.working_directory.clone(),
                }
            })
    }

    fn pin_value(&self, version: SemanticVersion) -> String {
        match self.plan.pin {
            PinStyle::Tag => VersionTag::new(version).name(),
            PinStyle::Version => version.to_string(),
        }
    }

    fn manifest_key(&self, library: &str) -> String {
        manifest_key(&self.plan.manifest_namespace, library)
    }

    /// Pin every published version in the manifest and commit it on the release line
    #[instrument(skip(self, run))]
    fn update_primary_project(&self, run: &ReleaseRun) -> Result<RunOutcome> {
        let prompt = self.tools.prompt;
        let branches = &self.plan.branches;
        let manifest = self.plan.manifest_path.as_path();

        prompt.info(&format!(
            "Working with primary project: {}",
            self.plan.primary_project.display()
        ));
        let repo = self.tools.repositories.open(&self.plan.primary_project)?;

        if ensure_branch(repo.as_ref(), &branches.remote, &branches.release)? {
            prompt.info(&format!("create {} branch", branches.release));
        }
        prompt.info(&format!("checkout {}", branches.release));
        repo.checkout(&branches.release)?;
        prompt.info(&format!("pulling {}", branches.release));
        repo.pull(&branches.remote, &branches.release)?;

        // Every key must exist before the first write, so a failure leaves the file untouched.
        for (library, _) in &run.versions_by_library {
            let key = self.manifest_key(library);
            if self
                .tools
                .manifest
                .read_dependency_version(manifest, &key)?
                .is_none()
            {
                return Err(ReleaseError::ManifestEntryMissing {
                    library: key,
                    manifest: manifest.to_path_buf(),
                });
            }
        }

        prompt.info(&format!(
            "Updating library versions in {}",
            manifest
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| manifest.display().to_string())
        ));
        for (library, version) in &run.versions_by_library {
            let key = self.manifest_key(library);
            let value = self.pin_value(*version);
            self.tools
                .manifest
                .write_dependency_version(manifest, &key, &value)?;
            info!(key = %key, value = %value, "manifest pin updated");
        }

        if let Some(installer) = self.tools.installer {
            prompt.info("Updating dependencies");
            match installer.update() {
                Ok(output) => {
                    let output = output.trim();
                    if !output.is_empty() {
                        prompt.info(output);
                    }
                }
                Err(err) => prompt.warn(
                    &ReleaseWarning::InstallerFailed {
                        command: installer.describe(),
                        reason: err.to_string(),
                    }
                    .to_string(),
                ),
            }
        }

        let message = run.commit_message();
        let commit = prompt.confirm(
            &format!(
                "Do you wish commit and push changes with message: \"{}\"",
                message
            ),
            true,
        )?;
        if !commit {
            prompt.warn(
                &ReleaseWarning::ManifestNotCommitted {
                    manifest: manifest.display().to_string(),
                }
                .to_string(),
            );
            return Ok(RunOutcome::CommitDeclined { message });
        }

        prompt.info("committing");
        repo.commit_all(&message)?;
        prompt.info(&format!("pushing {}", branches.release));
        repo.push(&branches.remote, &branches.release)?;

        Ok(RunOutcome::Committed { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BranchPolicy;
    use crate::git::{MockProvider, MockRepository};
    use crate::manifest::JsonManifest;
    use crate::ui::ScriptedPrompt;
    use std::fs;
    use tempfile::TempDir;

    struct Workspace {
        _root: TempDir,
        plan: ReleasePlan,
        provider: MockProvider,
        primary: MockRepository,
    }

    fn workspace(pin: PinStyle) -> Workspace {
        let root = TempDir::new().unwrap();
        let app = root.path().join("app");
        let lib = root.path().join("testlib");
        fs::create_dir(&app).unwrap();
        fs::create_dir(&lib).unwrap();
        fs::write(
            app.join("composer.json"),
            "{\n    \"require\": {\n        \"acme/testlib\": \"release-1.0.00\"\n    }\n}\n",
        )
        .unwrap();

        let primary = MockRepository::new(&app).with_branch("master", "p1");
        let library = MockRepository::new(&lib)
            .with_branch("master", "a1")
            .with_branch("release", "a0")
            .with_tag("release-1.0.00")
            .with_remote_commit("master", "b2");
        let provider = MockProvider::new()
            .with(&app, primary.clone())
            .with(&lib, library);

        let plan = ReleasePlan {
            primary_project: app.clone(),
            libraries: vec![LibraryDescriptor::sibling_of(&app, "testlib")],
            branches: BranchPolicy::default(),
            manifest_path: app.join("composer.json"),
            manifest_namespace: "acme".to_string(),
            pin,
        };

        Workspace {
            _root: root,
            plan,
            provider,
            primary,
        }
    }

    #[test]
    fn test_version_pin_style() {
        let ws = workspace(PinStyle::Version);
        let manifest = JsonManifest::default();
        let prompt = ScriptedPrompt::new();
        let orchestrator = ReleaseOrchestrator::new(
            &ws.plan,
            Collaborators {
                repositories: &ws.provider,
                manifest: &manifest,
                installer: None,
                prompt: &prompt,
            },
        );

        let report = orchestrator.run(Some("9")).unwrap();

        assert_eq!(
            report.outcome,
            RunOutcome::Committed {
                message: "refs #9 Released * testlib 1.0.01".to_string()
            }
        );
        assert_eq!(
            manifest
                .read_dependency_version(&ws.plan.manifest_path, "acme/testlib")
                .unwrap()
                .as_deref(),
            Some("1.0.01")
        );
    }

    #[test]
    fn test_primary_release_line_created_on_first_use() {
        let ws = workspace(PinStyle::Tag);
        let manifest = JsonManifest::default();
        let prompt = ScriptedPrompt::new();
        let orchestrator = ReleaseOrchestrator::new(
            &ws.plan,
            Collaborators {
                repositories: &ws.provider,
                manifest: &manifest,
                installer: None,
                prompt: &prompt,
            },
        );

        orchestrator.run(Some("9")).unwrap();

        assert_eq!(
            ws.primary.operations(),
            vec![
                "create_branch release",
                "push origin release",
                "checkout release",
                "pull origin release",
                "commit_all",
                "push origin release",
            ]
        );
        assert!(prompt.infos().contains(&"create release branch".to_string()));
    }

    #[test]
    fn test_continue_is_asked_only_after_a_failure() {
        let mut ws = workspace(PinStyle::Version);
        let broken = ws._root.path().join("broken");
        fs::create_dir(&broken).unwrap();
        let failing = MockRepository::new(&broken)
            .with_branch("master", "x1")
            .with_uncommitted_changes();
        ws.provider.register(&broken, failing);
        ws.plan.libraries.insert(
            0,
            LibraryDescriptor::sibling_of(&ws.plan.primary_project, "broken"),
        );

        let manifest = JsonManifest::default();
        let prompt = ScriptedPrompt::new();
        let orchestrator = ReleaseOrchestrator::new(
            &ws.plan,
            Collaborators {
                repositories: &ws.provider,
                manifest: &manifest,
                installer: None,
                prompt: &prompt,
            },
        );

        let report = orchestrator.run(Some("9")).unwrap();

        let continues = prompt
            .questions()
            .iter()
            .filter(|question| question.as_str() == "Do you wish to continue?")
            .count();
        assert_eq!(continues, 1);
        assert_eq!(
            prompt.questions()[0],
            "Do you wish to continue?".to_string()
        );
        assert_eq!(report.libraries.len(), 2);
        assert!(matches!(report.outcome, RunOutcome::Committed { .. }));
    }

    #[test]
    fn test_task_number_is_asked_when_missing() {
        let ws = workspace(PinStyle::Tag);
        let manifest = JsonManifest::default();
        let prompt = ScriptedPrompt::new().answer("abc");
        let orchestrator = ReleaseOrchestrator::new(
            &ws.plan,
            Collaborators {
                repositories: &ws.provider,
                manifest: &manifest,
                installer: None,
                prompt: &prompt,
            },
        );

        let err = orchestrator.run(None).unwrap_err();
        assert!(matches!(err, ReleaseError::InvalidInput(_)));
        assert_eq!(prompt.questions(), vec!["Enter task number:".to_string()]);
        assert!(ws.primary.operations().is_empty());
    }
}
