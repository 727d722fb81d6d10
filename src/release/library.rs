use std::fmt;
use tracing::{debug, info, instrument};

use crate::config::BranchPolicy;
use crate::domain::{SemanticVersion, TaskNumber, VersionTag};
use crate::error::{ReleaseError, Result};
use crate::git::{ensure_branch, RepositoryClient};
use crate::release::ChangeDetector;
use crate::ui::OperatorPrompt;
use crate::warning::ReleaseWarning;

/// Steps a library goes through while being released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseState {
    Start,
    CleanCheck,
    MainlineSync,
    DivergenceCheck,
    NoOp,
    MergeToRelease,
    TagDecision,
    Tagged,
    Skipped,
    Done,
}

impl fmt::Display for ReleaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReleaseState::Start => "start",
            ReleaseState::CleanCheck => "clean-check",
            ReleaseState::MainlineSync => "mainline-sync",
            ReleaseState::DivergenceCheck => "divergence-check",
            ReleaseState::NoOp => "no-op",
            ReleaseState::MergeToRelease => "merge-to-release",
            ReleaseState::TagDecision => "tag-decision",
            ReleaseState::Tagged => "tagged",
            ReleaseState::Skipped => "skipped",
            ReleaseState::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// What happened to one library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryOutcome {
    pub library: String,
    /// Version found on the release line before this run
    pub current_version: SemanticVersion,
    /// Mainline had new commits and was merged into the release line
    pub changed: bool,
    /// Version tagged and pushed by this run
    pub published: Option<SemanticVersion>,
}

/// Runs the release state machine for a single library working copy.
///
/// Stops at the first error and hands it back to the caller; nothing that was
/// already pushed is undone.
pub struct LibraryReleaser<'a> {
    policy: &'a BranchPolicy,
    prompt: &'a dyn OperatorPrompt,
    detector: ChangeDetector,
}

impl<'a> LibraryReleaser<'a> {
    pub fn new(policy: &'a BranchPolicy, prompt: &'a dyn OperatorPrompt) -> Self {
        LibraryReleaser {
            policy,
            prompt,
            detector: ChangeDetector::new(policy.remote.clone()),
        }
    }

    fn enter(&self, library: &str, state: ReleaseState) {
        debug!(library, %state, "state transition");
    }

    #[instrument(skip(self, repo, task), fields(path = %repo.path().display(), task = %task))]
    pub fn release(
        &self,
        library: &str,
        repo: &dyn RepositoryClient,
        task: &TaskNumber,
    ) -> Result<LibraryOutcome> {
        let BranchPolicy {
            remote,
            mainline,
            release,
        } = self.policy;

        self.enter(library, ReleaseState::Start);

        self.enter(library, ReleaseState::CleanCheck);
        if repo.has_uncommitted_changes()? {
            return Err(ReleaseError::DirtyWorkingCopy(repo.path().to_path_buf()));
        }
        let current_version = VersionTag::current_version(&repo.list_tags()?)?;
        debug!(library, %current_version, "current version");

        self.enter(library, ReleaseState::MainlineSync);
        self.prompt.info(&format!("checkout {}", mainline));
        repo.checkout(mainline)?;
        self.prompt.info(&format!("pulling {}", mainline));

        self.enter(library, ReleaseState::DivergenceCheck);
        let diverged = self.detector.has_mainline_diverged(repo, mainline)?;
        self.prompt.info(&format!("pushing {}", mainline));
        repo.push(remote, mainline)?;

        if !diverged {
            self.enter(library, ReleaseState::NoOp);
            self.enter(library, ReleaseState::Done);
            return Ok(LibraryOutcome {
                library: library.to_string(),
                current_version,
                changed: false,
                published: None,
            });
        }

        self.enter(library, ReleaseState::MergeToRelease);
        if ensure_branch(repo, remote, release)? {
            self.prompt.info(&format!("create {} branch", release));
        }
        self.prompt.info(&format!("checkout {}", release));
        repo.checkout(release)?;
        self.prompt.info(&format!("pulling {}", release));
        repo.pull(remote, release)?;
        self.prompt.info(&format!("merge {}->{}", mainline, release));
        repo.merge(mainline, &task.reference())?;
        self.prompt.info(&format!("pushing {}", release));
        repo.push(remote, release)?;

        self.enter(library, ReleaseState::TagDecision);
        let next = VersionTag::new(current_version.increment());
        let create = self
            .prompt
            .confirm(&format!("Create and push new tag: {}", next), true)?;

        let published = if create {
            repo.tag(&next.name())?;
            repo.push_tag(remote, &next.name())?;
            self.enter(library, ReleaseState::Tagged);
            info!(library, tag = %next, "tag published");
            Some(next.version)
        } else {
            self.enter(library, ReleaseState::Skipped);
            self.prompt.warn(
                &ReleaseWarning::UntaggedMerge {
                    library: library.to_string(),
                    release_line: release.clone(),
                    declined_tag: next.name(),
                }
                .to_string(),
            );
            None
        };

        self.enter(library, ReleaseState::Done);
        Ok(LibraryOutcome {
            library: library.to_string(),
            current_version,
            changed: true,
            published,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;
    use crate::ui::ScriptedPrompt;

    fn task() -> TaskNumber {
        TaskNumber::parse("42").unwrap()
    }

    fn released_library() -> MockRepository {
        MockRepository::new("/work/testlib")
            .with_branch("master", "a1")
            .with_branch("release", "a0")
            .with_tag("release-1.0.00")
    }

    #[test]
    fn test_unchanged_library_is_noop() {
        let repo = released_library();
        let policy = BranchPolicy::default();
        let prompt = ScriptedPrompt::new();

        let outcome = LibraryReleaser::new(&policy, &prompt)
            .release("testlib", &repo, &task())
            .unwrap();

        assert!(!outcome.changed);
        assert_eq!(outcome.published, None);
        assert_eq!(outcome.current_version, SemanticVersion::new(1, 0, 0));
        assert_eq!(
            repo.operations(),
            vec![
                "checkout master".to_string(),
                "pull origin master".to_string(),
                "push origin master".to_string(),
            ]
        );
        assert!(prompt.questions().is_empty());
    }

    #[test]
    fn test_changed_library_is_merged_and_tagged() {
        let repo = released_library().with_remote_commit("master", "b2");
        let policy = BranchPolicy::default();
        let prompt = ScriptedPrompt::new().confirm_with(true);

        let outcome = LibraryReleaser::new(&policy, &prompt)
            .release("testlib", &repo, &task())
            .unwrap();

        assert!(outcome.changed);
        assert_eq!(outcome.published, Some(SemanticVersion::new(1, 0, 1)));
        assert_eq!(
            repo.operations(),
            vec![
                "checkout master",
                "pull origin master",
                "push origin master",
                "checkout release",
                "pull origin release",
                "merge master",
                "push origin release",
                "tag release-1.0.01",
                "push_tag origin release-1.0.01",
            ]
        );
        assert_eq!(repo.merges(), vec!["refs #42".to_string()]);
        assert_eq!(repo.pushed_tags(), vec!["release-1.0.01".to_string()]);
        assert_eq!(
            prompt.questions(),
            vec!["Create and push new tag: release-1.0.01".to_string()]
        );
    }

    #[test]
    fn test_declined_tag_keeps_merge_but_publishes_nothing() {
        let repo = released_library().with_remote_commit("master", "b2");
        let policy = BranchPolicy::default();
        let prompt = ScriptedPrompt::new().confirm_with(false);

        let outcome = LibraryReleaser::new(&policy, &prompt)
            .release("testlib", &repo, &task())
            .unwrap();

        assert!(outcome.changed);
        assert_eq!(outcome.published, None);
        assert!(repo.has_operation("push origin release"));
        assert!(repo.pushed_tags().is_empty());
        assert_eq!(prompt.warnings().len(), 1);
        assert!(prompt.warnings()[0].contains("release-1.0.01"));
    }

    #[test]
    fn test_first_release_creates_release_line() {
        let repo = MockRepository::new("/work/newlib")
            .with_branch("master", "a1")
            .with_remote_commit("master", "b2");
        let policy = BranchPolicy::default();
        let prompt = ScriptedPrompt::new();

        let outcome = LibraryReleaser::new(&policy, &prompt)
            .release("newlib", &repo, &task())
            .unwrap();

        assert_eq!(outcome.current_version, SemanticVersion::initial());
        assert_eq!(outcome.published, Some(SemanticVersion::new(0, 0, 1)));
        assert!(repo.has_operation("create_branch release"));
        assert!(repo.has_operation("push_tag origin release-0.0.01"));
    }

    #[test]
    fn test_unchanged_library_without_release_line_is_noop() {
        let repo = MockRepository::new("/work/newlib").with_branch("master", "a1");
        let policy = BranchPolicy::default();
        let prompt = ScriptedPrompt::new();

        let outcome = LibraryReleaser::new(&policy, &prompt)
            .release("newlib", &repo, &task())
            .unwrap();

        assert!(!outcome.changed);
        assert_eq!(outcome.published, None);
        assert!(!repo.has_operation("create_branch release"));
        assert!(repo.list_tags().unwrap().is_empty());
        assert!(repo.pushed_tags().is_empty());
    }

    #[test]
    fn test_release_line_only_on_remote_is_checked_out_not_recreated() {
        let repo = MockRepository::new("/work/testlib")
            .with_branch("master", "a1")
            .with_remote_branch("release", "a0")
            .with_tag("release-1.0.00")
            .with_remote_commit("master", "b2");
        let policy = BranchPolicy::default();
        let prompt = ScriptedPrompt::new();

        let outcome = LibraryReleaser::new(&policy, &prompt)
            .release("testlib", &repo, &task())
            .unwrap();

        assert_eq!(outcome.published, Some(SemanticVersion::new(1, 0, 1)));
        assert!(!repo.has_operation("create_branch release"));
        assert!(repo.has_operation("checkout release"));
        assert!(repo.has_operation("push origin release"));
        assert_eq!(repo.merges(), vec!["refs #42".to_string()]);
    }

    #[test]
    fn test_dirty_working_copy_has_no_side_effects() {
        let repo = released_library().with_uncommitted_changes();
        let policy = BranchPolicy::default();
        let prompt = ScriptedPrompt::new();

        let err = LibraryReleaser::new(&policy, &prompt)
            .release("testlib", &repo, &task())
            .unwrap_err();

        assert!(matches!(err, ReleaseError::DirtyWorkingCopy(_)));
        assert!(repo.operations().is_empty());
    }

    #[test]
    fn test_malformed_tag_aborts_before_checkout() {
        let repo = released_library().with_tag("release-1.2");
        let policy = BranchPolicy::default();
        let prompt = ScriptedPrompt::new();

        let err = LibraryReleaser::new(&policy, &prompt)
            .release("testlib", &repo, &task())
            .unwrap_err();

        assert!(matches!(err, ReleaseError::Parse(_)));
        assert!(repo.operations().is_empty());
    }

    #[test]
    fn test_merge_conflict_stops_before_tagging() {
        let repo = released_library()
            .with_remote_commit("master", "b2")
            .failing_on("merge", "CONFLICT (content): Merge conflict in src/Client.php");
        let policy = BranchPolicy::default();
        let prompt = ScriptedPrompt::new();

        let err = LibraryReleaser::new(&policy, &prompt)
            .release("testlib", &repo, &task())
            .unwrap_err();

        assert!(err.to_string().contains("CONFLICT"));
        assert!(!repo.has_operation("push origin release"));
        assert!(prompt.questions().is_empty());
    }

    #[test]
    fn test_custom_branch_names() {
        let repo = MockRepository::new("/work/testlib")
            .with_branch("develop", "a1")
            .with_branch("stable", "a0")
            .with_tag("release-0.9.99")
            .with_remote_commit("develop", "b2");
        let policy = BranchPolicy {
            remote: "origin".to_string(),
            mainline: "develop".to_string(),
            release: "stable".to_string(),
        };
        let prompt = ScriptedPrompt::new();

        let outcome = LibraryReleaser::new(&policy, &prompt)
            .release("testlib", &repo, &task())
            .unwrap();

        assert_eq!(outcome.published, Some(SemanticVersion::new(1, 0, 0)));
        assert!(repo.has_operation("merge develop"));
        assert!(repo.has_operation("push origin stable"));
    }
}
