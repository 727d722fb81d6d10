use tracing::{debug, instrument};

use crate::error::{ReleaseError, Result};
use crate::git::RepositoryClient;

/// Decides whether a mainline picked up new commits since it was last synchronized.
///
/// Compares commit ids rather than diffs: the id the remote was last known to
/// have for the branch is recorded, the branch is pulled, and the local id
/// after the pull is compared against it.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    remote: String,
}

impl ChangeDetector {
    pub fn new(remote: impl Into<String>) -> Self {
        ChangeDetector {
            remote: remote.into(),
        }
    }

    /// Pull `branch` and report whether it now differs from the last synchronized state.
    ///
    /// The branch must be checked out. Fails with `DirtyWorkingCopy` when the
    /// working copy has pending changes; a failed pull is returned as is.
    #[instrument(skip(self, repo), fields(path = %repo.path().display(), remote = %self.remote))]
    pub fn has_mainline_diverged(&self, repo: &dyn RepositoryClient, branch: &str) -> Result<bool> {
        if repo.has_uncommitted_changes()? {
            return Err(ReleaseError::DirtyWorkingCopy(repo.path().to_path_buf()));
        }

        let tracking_ref = format!("{}/{}", self.remote, branch);
        let local_before = repo.rev_parse(branch)?;
        // Before the first fetch there is no remote-tracking ref; the local head stands in.
        let recorded = match repo.rev_parse(&tracking_ref)? {
            Some(id) => Some(id),
            None => local_before.clone(),
        };

        repo.pull(&self.remote, branch)?;
        let local_after = repo.rev_parse(branch)?;

        debug!(
            branch,
            before = ?local_before,
            recorded = ?recorded,
            after = ?local_after,
            "compared mainline ids"
        );

        Ok(local_after != recorded)
    }
}
