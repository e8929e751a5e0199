use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use git2::Oid;

use crate::error::{ReleaseError, Result};
use crate::git::{RemoteRef, Repository};

/// Build a fake OID from a single byte, handy for tests
pub fn oid(n: u8) -> Oid {
    Oid::from_bytes(&[n; 20]).unwrap_or_else(|_| Oid::zero())
}

/// A commit recorded by [MockRepository::commit_paths]
#[derive(Debug, Clone, PartialEq)]
pub struct MockCommit {
    pub oid: Oid,
    pub branch: String,
    pub message: String,
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Default)]
struct MockState {
    parents: HashMap<Oid, Vec<Oid>>,
    branches: BTreeMap<String, Oid>,
    remotes: BTreeMap<String, BTreeMap<String, Oid>>,
    upstreams: HashMap<String, String>,
    head: Option<String>,
    dirty: bool,
    fetches: Vec<String>,
    commits: Vec<MockCommit>,
    tags: BTreeMap<String, Option<String>>,
    next_oid: u8,
}

/// In-memory repository for testing without actual git operations
///
/// Commits form a real graph (each commit lists its parents), so ahead/behind
/// counts behave like git's.
#[derive(Debug)]
pub struct MockRepository {
    state: RefCell<MockState>,
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        MockRepository {
            state: RefCell::new(MockState {
                next_oid: 200,
                ..MockState::default()
            }),
        }
    }

    /// Add a commit with its parents
    pub fn add_commit(&self, oid: Oid, parents: &[Oid]) {
        self.state.borrow_mut().parents.insert(oid, parents.to_vec());
    }

    /// Set a local branch head
    pub fn set_branch_head(&self, branch: impl Into<String>, oid: Oid) {
        self.state.borrow_mut().branches.insert(branch.into(), oid);
    }

    /// Declare a remote without any branch
    pub fn add_remote(&self, remote: impl Into<String>) {
        self.state
            .borrow_mut()
            .remotes
            .entry(remote.into())
            .or_default();
    }

    /// Set a remote-tracking branch head
    pub fn set_remote_branch(&self, remote: impl Into<String>, branch: impl Into<String>, oid: Oid) {
        self.state
            .borrow_mut()
            .remotes
            .entry(remote.into())
            .or_default()
            .insert(branch.into(), oid);
    }

    /// Configure a tracking branch directly, bypassing any check
    pub fn set_upstream(&self, branch: impl Into<String>, upstream: impl Into<String>) {
        self.state
            .borrow_mut()
            .upstreams
            .insert(branch.into(), upstream.into());
    }

    /// Set the checked out branch
    pub fn set_head(&self, branch: impl Into<String>) {
        self.state.borrow_mut().head = Some(branch.into());
    }

    pub fn set_dirty(&self, dirty: bool) {
        self.state.borrow_mut().dirty = dirty;
    }

    /// Local branch head, if the branch exists
    pub fn branch_head(&self, branch: &str) -> Option<Oid> {
        self.state.borrow().branches.get(branch).copied()
    }

    /// Raw tracking configuration of a branch
    pub fn upstream_of(&self, branch: &str) -> Option<String> {
        self.state.borrow().upstreams.get(branch).cloned()
    }

    /// Remotes fetched so far, in order
    pub fn fetches(&self) -> Vec<String> {
        self.state.borrow().fetches.clone()
    }

    pub fn commits(&self) -> Vec<MockCommit> {
        self.state.borrow().commits.clone()
    }

    /// Tags created so far with their annotation message
    pub fn tags(&self) -> BTreeMap<String, Option<String>> {
        self.state.borrow().tags.clone()
    }

    fn ancestors(&self, start: Oid) -> HashSet<Oid> {
        let state = self.state.borrow();
        let mut seen = HashSet::new();
        let mut stack = vec![start];

        while let Some(current) = stack.pop() {
            if seen.insert(current) {
                if let Some(parents) = state.parents.get(&current) {
                    stack.extend(parents.iter().copied());
                }
            }
        }

        seen
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn remote_names(&self) -> Result<Vec<String>> {
        Ok(self.state.borrow().remotes.keys().cloned().collect())
    }

    fn remote_branch_names(&self, remote: &str) -> Result<Vec<String>> {
        let state = self.state.borrow();
        let branches = state
            .remotes
            .get(remote)
            .ok_or_else(|| ReleaseError::InvalidRemote(remote.to_string()))?;
        Ok(branches.keys().cloned().collect())
    }

    fn remote_branch_oid(&self, remote: &str, branch: &str) -> Result<Option<Oid>> {
        let state = self.state.borrow();
        Ok(state
            .remotes
            .get(remote)
            .and_then(|branches| branches.get(branch))
            .copied())
    }

    fn local_branch_names(&self) -> Result<Vec<String>> {
        Ok(self.state.borrow().branches.keys().cloned().collect())
    }

    fn get_branch_head_oid(&self, branch: &str) -> Result<Oid> {
        self.branch_head(branch)
            .ok_or_else(|| ReleaseError::BranchNotFound(branch.to_string()))
    }

    fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.state.borrow().head.clone())
    }

    fn tracking_branch(&self, branch: &str) -> Result<Option<String>> {
        Ok(self.upstream_of(branch))
    }

    fn set_tracking_branch(&self, branch: &str, upstream: &RemoteRef) -> Result<()> {
        self.set_upstream(branch, upstream.to_string());
        Ok(())
    }

    fn set_branch_target(&self, branch: &str, oid: Oid, _reflog_message: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        match state.branches.get_mut(branch) {
            Some(head) => {
                *head = oid;
                Ok(())
            }
            None => Err(ReleaseError::BranchNotFound(branch.to_string())),
        }
    }

    fn create_branch(&self, branch: &str, oid: Oid) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.branches.contains_key(branch) {
            return Err(ReleaseError::config(format!(
                "Branch '{}' already exists",
                branch
            )));
        }
        state.branches.insert(branch.to_string(), oid);
        Ok(())
    }

    fn ahead_behind(&self, oid: Oid, base: Oid) -> Result<(usize, usize)> {
        let ours = self.ancestors(oid);
        let theirs = self.ancestors(base);
        Ok((
            ours.difference(&theirs).count(),
            theirs.difference(&ours).count(),
        ))
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.remotes.contains_key(remote) {
            return Err(ReleaseError::InvalidRemote(remote.to_string()));
        }
        state.fetches.push(remote.to_string());
        Ok(())
    }

    fn checkout_branch(&self, branch: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.branches.contains_key(branch) {
            return Err(ReleaseError::BranchNotFound(branch.to_string()));
        }
        state.head = Some(branch.to_string());
        Ok(())
    }

    fn is_dirty(&self) -> Result<bool> {
        Ok(self.state.borrow().dirty)
    }

    fn commit_paths(&self, paths: &[PathBuf], message: &str, _sign_off: bool) -> Result<Oid> {
        let mut state = self.state.borrow_mut();
        let branch = state
            .head
            .clone()
            .ok_or_else(|| ReleaseError::config("Cannot commit on a detached HEAD"))?;
        let parent = state.branches.get(&branch).copied();

        let new_oid = oid(state.next_oid);
        state.next_oid = state.next_oid.wrapping_add(1);
        state.parents.insert(new_oid, parent.into_iter().collect());
        state.branches.insert(branch.clone(), new_oid);
        state.commits.push(MockCommit {
            oid: new_oid,
            branch,
            message: message.to_string(),
            paths: paths.to_vec(),
        });

        Ok(new_oid)
    }

    fn create_tag(&self, name: &str, message: Option<&str>) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.tags.contains_key(name) {
            return Err(ReleaseError::config(format!("Tag '{}' already exists", name)));
        }
        state
            .tags
            .insert(name.to_string(), message.map(str::to_string));
        Ok(())
    }
}
