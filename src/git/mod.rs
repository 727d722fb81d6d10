//! Git operations abstraction layer
//!
//! The release workflow only talks to working copies through the
//! [RepositoryClient] trait, so it can run against real repositories or
//! against in-memory fakes in tests.
//!
//! - [repository::GitWorkingCopy]: real working copy (git2 for local reads and
//!   ref writes, the `git` binary for checkout, pull, push, merge and commit)
//! - [mock::MockRepository]: scriptable fake that records every operation
//!
//! Working copies are opened through a [RepositoryProvider], which lets the
//! orchestrator open one client per library path.
//!
//! ```rust
//! # use release_libs::git::RepositoryClient;
//! # fn example(repo: &dyn RepositoryClient) -> release_libs::Result<()> {
//! repo.checkout("master")?;
//! repo.pull("origin", "master")?;
//! let head = repo.rev_parse("master")?;
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::{MockProvider, MockRepository};
pub use repository::{GitProvider, GitWorkingCopy};

use crate::error::Result;
use std::collections::BTreeSet;
use std::path::Path;

/// Operations the release workflow needs from a working copy.
///
/// All calls are synchronous and block until git has finished. Errors from
/// the underlying client are mapped to [crate::error::ReleaseError] and never
/// retried.
pub trait RepositoryClient {
    /// Working copy root
    fn path(&self) -> &Path;

    /// Switch the working copy to a local branch
    fn checkout(&self, branch: &str) -> Result<()>;

    /// Fast-forward the checked-out branch from `remote`
    ///
    /// A pull that cannot fast-forward fails; conflicts are never resolved here.
    fn pull(&self, remote: &str, branch: &str) -> Result<()>;

    /// Push a local branch to `remote`
    fn push(&self, remote: &str, branch: &str) -> Result<()>;

    /// Push a single tag to `remote`
    fn push_tag(&self, remote: &str, tag: &str) -> Result<()>;

    /// Merge `branch` into the checked-out branch using `message` for the merge commit
    fn merge(&self, branch: &str, message: &str) -> Result<()>;

    /// Create a lightweight tag on HEAD
    fn tag(&self, name: &str) -> Result<()>;

    /// All tag names, sorted
    fn list_tags(&self) -> Result<Vec<String>>;

    /// Local branch names
    fn list_branches(&self) -> Result<BTreeSet<String>>;

    /// Whether the working copy has modified, staged or untracked files
    fn has_uncommitted_changes(&self) -> Result<bool>;

    /// Commit id a reference resolves to, `None` if it does not resolve
    fn rev_parse(&self, reference: &str) -> Result<Option<String>>;

    /// Create a local branch at HEAD
    fn create_branch(&self, name: &str) -> Result<()>;

    /// Commit every tracked modification with `message`
    fn commit_all(&self, message: &str) -> Result<()>;
}

/// Opens working copies by path
pub trait RepositoryProvider {
    fn open(&self, path: &Path) -> Result<Box<dyn RepositoryClient>>;
}

/// Make sure `branch` exists locally or on `remote`, creating it at HEAD and publishing it if neither has it.
///
/// A branch known only through `<remote>/<branch>` is left for `checkout` to
/// set up as a tracking branch. Returns `true` when the branch had to be created.
pub fn ensure_branch(repo: &dyn RepositoryClient, remote: &str, branch: &str) -> Result<bool> {
    if repo.list_branches()?.contains(branch) {
        return Ok(false);
    }
    if repo.rev_parse(&format!("{}/{}", remote, branch))?.is_some() {
        return Ok(false);
    }

    repo.create_branch(branch)?;
    repo.push(remote, branch)?;
    Ok(true)
}
