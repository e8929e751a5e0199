//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the Git operations a release
//! needs, allowing for a real implementation and an in-memory one for testing.
//!
//! # Overview
//!
//! The primary abstraction is the [Repository] trait. The concrete implementations include:
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: An in-memory commit graph for testing
//!
//! On top of the trait sit the branch algorithms:
//!
//! - [compare::compare_refs]: classify two commits as ahead/equal/behind/unrelated
//! - [reconcile::update_branch]: bring a local branch in line with its remote counterpart
//! - [reconcile::create_branch]: create a branch, tracking the remote when possible
//!
//! ```rust
//! # use project_release::git::{compare_refs, Repository};
//! # fn example<R: Repository>(repo: &R) -> project_release::Result<()> {
//! let local = repo.get_branch_head_oid("main")?;
//! if let Some(remote) = repo.remote_branch_oid("origin", "main")? {
//!     println!("main is {:?} origin/main", compare_refs(repo, local, remote)?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod compare;
pub mod mock;
pub mod reconcile;
pub mod repository;

pub use compare::{compare_refs, RefPosition};
pub use mock::MockRepository;
pub use reconcile::{create_branch, update_branch, BranchUpdate};
pub use repository::Git2Repository;

use std::fmt;
use std::path::PathBuf;

use crate::error::Result;
use git2::Oid;

/// A remote-tracking branch, e.g. `origin/main`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteRef {
    /// The remote name (e.g. "origin")
    pub remote: String,
    /// The branch name on the remote (e.g. "main")
    pub branch: String,
}

impl RemoteRef {
    pub fn new(remote: impl Into<String>, branch: impl Into<String>) -> Self {
        RemoteRef {
            remote: remote.into(),
            branch: branch.into(),
        }
    }

    /// Full reference name, e.g. `refs/remotes/origin/main`
    pub fn refname(&self) -> String {
        format!("refs/remotes/{}/{}", self.remote, self.branch)
    }
}

impl fmt::Display for RemoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.remote, self.branch)
    }
}

/// Common git operation trait for abstraction
///
/// ## Concurrency
///
/// A release run owns the repository for its whole duration. Every method blocks
/// until the operation is complete, and implementors are not required to be thread safe.
///
/// ## Error Handling
///
/// All methods return [crate::error::Result<T>]. Implementations map underlying
/// errors (like `git2::Error`) to the appropriate [crate::error::ReleaseError] variants.
pub trait Repository {
    /// Names of the configured remotes, sorted
    fn remote_names(&self) -> Result<Vec<String>>;

    /// Branch names known for a remote, without the remote prefix and without `HEAD`
    fn remote_branch_names(&self, remote: &str) -> Result<Vec<String>>;

    /// Commit of a remote-tracking branch, or `None` if the remote has no such branch
    fn remote_branch_oid(&self, remote: &str, branch: &str) -> Result<Option<Oid>>;

    /// Names of the local branches, sorted
    fn local_branch_names(&self) -> Result<Vec<String>>;

    /// Whether a local branch exists
    fn branch_exists(&self, branch: &str) -> Result<bool> {
        Ok(self.local_branch_names()?.iter().any(|name| name == branch))
    }

    /// Get the OID of a local branch's HEAD
    ///
    /// # Returns
    /// * `Ok(Oid)` - Object ID of the branch's HEAD commit
    /// * `Err` - If the branch doesn't exist or if there's a Git error
    fn get_branch_head_oid(&self, branch: &str) -> Result<Oid>;

    /// The checked out branch, or `None` when HEAD is detached or unborn
    fn current_branch(&self) -> Result<Option<String>>;

    /// The tracking branch of a local branch, as `remote/branch`
    fn tracking_branch(&self, branch: &str) -> Result<Option<String>>;

    /// Configure a local branch to track a remote-tracking branch
    fn set_tracking_branch(&self, branch: &str, upstream: &RemoteRef) -> Result<()>;

    /// Point a local branch to another commit, updating the working tree if it is checked out
    fn set_branch_target(&self, branch: &str, oid: Oid, reflog_message: &str) -> Result<()>;

    /// Create a local branch at a commit
    fn create_branch(&self, branch: &str, oid: Oid) -> Result<()>;

    /// Count commits reachable from `oid` but not `base`, and from `base` but not `oid`
    fn ahead_behind(&self, oid: Oid, base: Oid) -> Result<(usize, usize)>;

    /// Fetch every branch and tag of a remote
    fn fetch(&self, remote: &str) -> Result<()>;

    /// Make a local branch the active branch
    fn checkout_branch(&self, branch: &str) -> Result<()>;

    /// Whether tracked files have uncommitted changes
    fn is_dirty(&self) -> Result<bool>;

    /// Commit the given files on the active branch
    fn commit_paths(&self, paths: &[PathBuf], message: &str, sign_off: bool) -> Result<Oid>;

    /// Tag the active commit, annotated when a message is given
    fn create_tag(&self, name: &str, message: Option<&str>) -> Result<()>;
}
