use crate::error::{ReleaseError, Result};
use crate::git::{RepositoryClient, RepositoryProvider};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::rc::Rc;

const DEFAULT_REMOTE: &str = "origin";

#[derive(Debug, Default)]
struct MockState {
    current_branch: Option<String>,
    /// Local branch heads
    local: BTreeMap<String, String>,
    /// Branch heads as stored on the remote server
    remote: BTreeMap<String, String>,
    /// Remote-tracking refs, keyed `<remote>/<branch>`
    tracking: BTreeMap<String, String>,
    tags: BTreeSet<String>,
    pushed_tags: Vec<String>,
    merges: Vec<String>,
    commits: Vec<String>,
    dirty: bool,
    failures: HashMap<String, String>,
    operations: Vec<String>,
    next_commit: usize,
}

impl MockState {
    fn fail_if_scripted(&self, operation: &str) -> Result<()> {
        match self.failures.get(operation) {
            Some(message) => Err(ReleaseError::command(
                format!("git {}", operation),
                message.clone(),
            )),
            None => Ok(()),
        }
    }

    fn new_commit_id(&mut self) -> String {
        self.next_commit += 1;
        format!("mock-commit-{}", self.next_commit)
    }

    fn current(&self) -> Result<String> {
        self.current_branch
            .clone()
            .ok_or_else(|| ReleaseError::command("git", "HEAD does not point at a branch"))
    }
}

/// In-memory working copy for tests.
///
/// Clones share state, so a test can hand one clone to the code under test
/// and inspect the recorded operations through another.
#[derive(Debug, Clone, Default)]
pub struct MockRepository {
    path: PathBuf,
    state: Rc<RefCell<MockState>>,
}

impl MockRepository {
    /// Create an empty mock working copy at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        MockRepository {
            path: path.into(),
            state: Rc::new(RefCell::new(MockState::default())),
        }
    }

    /// Add a branch that is in sync with `origin`
    pub fn with_branch(self, branch: &str, commit: &str) -> Self {
        {
            let mut state = self.state.borrow_mut();
            state.local.insert(branch.to_string(), commit.to_string());
            state.remote.insert(branch.to_string(), commit.to_string());
            state
                .tracking
                .insert(format!("{}/{}", DEFAULT_REMOTE, branch), commit.to_string());
            if state.current_branch.is_none() {
                state.current_branch = Some(branch.to_string());
            }
        }
        self
    }

    /// Add a branch that exists on `origin` but has no local branch yet, as in a fresh clone
    pub fn with_remote_branch(self, branch: &str, commit: &str) -> Self {
        {
            let mut state = self.state.borrow_mut();
            state.remote.insert(branch.to_string(), commit.to_string());
            state
                .tracking
                .insert(format!("{}/{}", DEFAULT_REMOTE, branch), commit.to_string());
        }
        self
    }

    /// Simulate somebody else pushing `commit` to the remote branch
    pub fn with_remote_commit(self, branch: &str, commit: &str) -> Self {
        self.state
            .borrow_mut()
            .remote
            .insert(branch.to_string(), commit.to_string());
        self
    }

    /// Simulate a local commit that has not been pushed yet
    pub fn with_local_commit(self, branch: &str, commit: &str) -> Self {
        self.state
            .borrow_mut()
            .local
            .insert(branch.to_string(), commit.to_string());
        self
    }

    /// Add an existing tag
    pub fn with_tag(self, name: &str) -> Self {
        self.state.borrow_mut().tags.insert(name.to_string());
        self
    }

    /// Mark the working copy as having uncommitted changes
    pub fn with_uncommitted_changes(self) -> Self {
        self.state.borrow_mut().dirty = true;
        self
    }

    /// Make an operation fail, keyed by its recorded form without arguments (e.g. "merge", "pull")
    pub fn failing_on(self, operation: &str, message: &str) -> Self {
        self.state
            .borrow_mut()
            .failures
            .insert(operation.to_string(), message.to_string());
        self
    }

    /// Every operation performed, in order (e.g. "checkout master", "push origin release")
    pub fn operations(&self) -> Vec<String> {
        self.state.borrow().operations.clone()
    }

    pub fn has_operation(&self, operation: &str) -> bool {
        self.state.borrow().operations.iter().any(|op| op == operation)
    }

    /// Tags pushed to the remote
    pub fn pushed_tags(&self) -> Vec<String> {
        self.state.borrow().pushed_tags.clone()
    }

    /// Messages of all merges performed
    pub fn merges(&self) -> Vec<String> {
        self.state.borrow().merges.clone()
    }

    /// Messages of all commits created
    pub fn commits(&self) -> Vec<String> {
        self.state.borrow().commits.clone()
    }

    /// Head of a branch on the remote
    pub fn remote_head(&self, branch: &str) -> Option<String> {
        self.state.borrow().remote.get(branch).cloned()
    }

    fn record(&self, operation: String) {
        self.state.borrow_mut().operations.push(operation);
    }
}

impl RepositoryClient for MockRepository {
    fn path(&self) -> &Path {
        &self.path
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        self.record(format!("checkout {}", branch));
        let mut state = self.state.borrow_mut();
        state.fail_if_scripted("checkout")?;
        if !state.local.contains_key(branch) {
            // git creates a local tracking branch from a unique `<remote>/<branch>`
            let tracked = state
                .tracking
                .iter()
                .find(|(key, _)| key.split_once('/').map(|(_, name)| name) == Some(branch))
                .map(|(_, commit)| commit.clone());
            if let Some(commit) = tracked {
                state.local.insert(branch.to_string(), commit);
                state.current_branch = Some(branch.to_string());
                return Ok(());
            }
            return Err(ReleaseError::command(
                format!("git checkout {}", branch),
                format!("pathspec '{}' did not match any file(s) known to git", branch),
            ));
        }
        state.current_branch = Some(branch.to_string());
        Ok(())
    }

    fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        self.record(format!("pull {} {}", remote, branch));
        let mut state = self.state.borrow_mut();
        state.fail_if_scripted("pull")?;

        let tracking_key = format!("{}/{}", remote, branch);
        if let Some(remote_head) = state.remote.get(branch).cloned() {
            let known = state.tracking.get(&tracking_key).cloned();
            // Only fast-forward when the remote moved; unpushed local commits stay.
            if known.as_deref() != Some(remote_head.as_str()) {
                state.local.insert(branch.to_string(), remote_head.clone());
            }
            state.tracking.insert(tracking_key, remote_head);
        }
        Ok(())
    }

    fn push(&self, remote: &str, branch: &str) -> Result<()> {
        self.record(format!("push {} {}", remote, branch));
        let mut state = self.state.borrow_mut();
        state.fail_if_scripted("push")?;

        let head = state.local.get(branch).cloned().ok_or_else(|| {
            ReleaseError::command(
                format!("git push {} {}", remote, branch),
                format!("src refspec {} does not match any", branch),
            )
        })?;
        state.remote.insert(branch.to_string(), head.clone());
        state.tracking.insert(format!("{}/{}", remote, branch), head);
        Ok(())
    }

    fn push_tag(&self, remote: &str, tag: &str) -> Result<()> {
        self.record(format!("push_tag {} {}", remote, tag));
        let mut state = self.state.borrow_mut();
        state.fail_if_scripted("push_tag")?;
        if !state.tags.contains(tag) {
            return Err(ReleaseError::command(
                format!("git push {} refs/tags/{}", remote, tag),
                format!("src refspec refs/tags/{} does not match any", tag),
            ));
        }
        state.pushed_tags.push(tag.to_string());
        Ok(())
    }

    fn merge(&self, branch: &str, message: &str) -> Result<()> {
        self.record(format!("merge {}", branch));
        let mut state = self.state.borrow_mut();
        state.fail_if_scripted("merge")?;

        if !state.local.contains_key(branch) {
            return Err(ReleaseError::command(
                format!("git merge {}", branch),
                format!("merge: {} - not something we can merge", branch),
            ));
        }
        let target = state.current()?;
        let merge_commit = state.new_commit_id();
        state.local.insert(target, merge_commit);
        state.merges.push(message.to_string());
        Ok(())
    }

    fn tag(&self, name: &str) -> Result<()> {
        self.record(format!("tag {}", name));
        let mut state = self.state.borrow_mut();
        state.fail_if_scripted("tag")?;
        if !state.tags.insert(name.to_string()) {
            return Err(ReleaseError::command(
                format!("git tag {}", name),
                format!("tag '{}' already exists", name),
            ));
        }
        Ok(())
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let state = self.state.borrow();
        state.fail_if_scripted("list_tags")?;
        Ok(state.tags.iter().cloned().collect())
    }

    fn list_branches(&self) -> Result<BTreeSet<String>> {
        Ok(self.state.borrow().local.keys().cloned().collect())
    }

    fn has_uncommitted_changes(&self) -> Result<bool> {
        Ok(self.state.borrow().dirty)
    }

    fn rev_parse(&self, reference: &str) -> Result<Option<String>> {
        let state = self.state.borrow();
        Ok(state
            .local
            .get(reference)
            .or_else(|| state.tracking.get(reference))
            .cloned())
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        self.record(format!("create_branch {}", name));
        let mut state = self.state.borrow_mut();
        state.fail_if_scripted("create_branch")?;
        let current = state.current()?;
        let head = state.local.get(&current).cloned().unwrap_or_default();
        state.local.insert(name.to_string(), head);
        Ok(())
    }

    fn commit_all(&self, message: &str) -> Result<()> {
        self.record("commit_all".to_string());
        let mut state = self.state.borrow_mut();
        state.fail_if_scripted("commit_all")?;
        let current = state.current()?;
        let commit = state.new_commit_id();
        state.local.insert(current, commit);
        state.commits.push(message.to_string());
        Ok(())
    }
}

/// Hands out [MockRepository] clones registered per path
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    repositories: HashMap<PathBuf, MockRepository>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mock for the working copy at `path`
    pub fn register(&mut self, path: impl AsRef<Path>, repo: MockRepository) {
        self.repositories.insert(normalize(path.as_ref()), repo);
    }

    pub fn with(mut self, path: impl AsRef<Path>, repo: MockRepository) -> Self {
        self.register(path, repo);
        self
    }
}

fn normalize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

impl RepositoryProvider for MockProvider {
    fn open(&self, path: &Path) -> Result<Box<dyn RepositoryClient>> {
        self.repositories
            .get(&normalize(path))
            .cloned()
            .map(|repo| Box::new(repo) as Box<dyn RepositoryClient>)
            .ok_or_else(|| {
                ReleaseError::Git(git2::Error::from_str(&format!(
                    "could not find repository at '{}'",
                    path.display()
                )))
            })
    }
}
