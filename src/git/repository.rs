use crate::error::{ReleaseError, Result};
use crate::git::{RepositoryClient, RepositoryProvider};
use git2::{BranchType, ErrorCode, Repository as Git2Repo, StatusOptions};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, instrument};

/// Working copy on disk.
///
/// Reads and local ref writes go through git2. Anything that talks to a
/// remote or rewrites the worktree shells out to the system `git`, which
/// picks up the operator's credential helpers and SSH agent.
pub struct GitWorkingCopy {
    repo: Git2Repo,
    path: PathBuf,
}

impl GitWorkingCopy {
    /// Open the working copy rooted at `path`
    #[instrument(fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Git2Repo::open(path)?;
        let root = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| ReleaseError::config(format!("{} is a bare repository", path.display())))?;

        info!(path = %root.display(), "opened working copy");
        Ok(GitWorkingCopy { repo, path: root })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Result<Self> {
        let path = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| ReleaseError::config("bare repositories have no working copy"))?;
        Ok(GitWorkingCopy { repo, path })
    }

    /// Run the system git inside this working copy and return its combined output.
    fn git(&self, args: &[&str]) -> Result<String> {
        let command_line = format!("git {}", args.join(" "));
        let start = std::time::Instant::now();

        let output = Command::new("git")
            .arg("-C")
            .arg(&self.path)
            .args(args)
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(ReleaseError::command(command_line, detail));
        }

        debug!(
            path = %self.path.display(),
            command = %command_line,
            duration_ms = start.elapsed().as_millis(),
            stdout = %stdout.trim(),
            stderr = %stderr.trim(),
            "git finished"
        );

        Ok(format!("{}{}", stdout, stderr))
    }

    fn head_commit(&self) -> Result<git2::Commit<'_>> {
        Ok(self.repo.head()?.peel_to_commit()?)
    }
}

impl RepositoryClient for GitWorkingCopy {
    fn path(&self) -> &Path {
        &self.path
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn checkout(&self, branch: &str) -> Result<()> {
        self.git(&["checkout", branch]).map(|_| ())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        self.git(&["pull", "--ff-only", remote, branch]).map(|_| ())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn push(&self, remote: &str, branch: &str) -> Result<()> {
        self.git(&["push", remote, branch]).map(|_| ())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn push_tag(&self, remote: &str, tag: &str) -> Result<()> {
        let refspec = format!("refs/tags/{}", tag);
        self.git(&["push", remote, &refspec]).map(|_| ())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn merge(&self, branch: &str, message: &str) -> Result<()> {
        // Always record a merge commit so the release line carries the task reference.
        self.git(&["merge", "--no-ff", "--no-edit", "-m", message, branch])
            .map(|_| ())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn tag(&self, name: &str) -> Result<()> {
        let head = self.head_commit()?;
        self.repo.tag_lightweight(name, head.as_object(), false)?;
        info!(tag = name, commit = %head.id(), "created tag");
        Ok(())
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None)?;
        let mut names: Vec<String> = tags.iter().flatten().map(|s| s.to_string()).collect();
        names.sort();
        Ok(names)
    }

    fn list_branches(&self) -> Result<BTreeSet<String>> {
        let mut names = BTreeSet::new();
        for branch in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = branch?;
            if let Some(name) = branch.name()? {
                names.insert(name.to_string());
            }
        }
        Ok(names)
    }

    fn has_uncommitted_changes(&self) -> Result<bool> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .include_ignored(false)
            .recurse_untracked_dirs(false);

        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(!statuses.is_empty())
    }

    fn rev_parse(&self, reference: &str) -> Result<Option<String>> {
        match self.repo.revparse_single(reference) {
            Ok(object) => Ok(Some(object.peel_to_commit()?.id().to_string())),
            Err(e) if matches!(e.code(), ErrorCode::NotFound | ErrorCode::InvalidSpec) => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn create_branch(&self, name: &str) -> Result<()> {
        let head = self.head_commit()?;
        self.repo.branch(name, &head, false)?;
        info!(branch = name, commit = %head.id(), "created branch");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn commit_all(&self, message: &str) -> Result<()> {
        self.git(&["commit", "-a", "-m", message]).map(|_| ())
    }
}

/// Opens [GitWorkingCopy] instances
#[derive(Debug, Clone, Copy, Default)]
pub struct GitProvider;

impl RepositoryProvider for GitProvider {
    fn open(&self, path: &Path) -> Result<Box<dyn RepositoryClient>> {
        Ok(Box::new(GitWorkingCopy::open(path)?))
    }
}
