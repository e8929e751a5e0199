use std::path::{Path, PathBuf};

use git2::build::CheckoutBuilder;
use git2::{BranchType, Cred, CredentialType, Oid, Repository as Git2Repo, StatusOptions};
use tracing::debug;

use crate::error::{ReleaseError, Result};
use crate::git::RemoteRef;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)
            .map_err(|e| ReleaseError::config(format!("Not in a git repository: {}", e)))?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    /// Root of the working tree, `None` for bare repositories
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Make `path` relative to the working tree, as the index expects.
    fn index_path(&self, path: &Path) -> Result<PathBuf> {
        let workdir = self
            .repo
            .workdir()
            .ok_or_else(|| ReleaseError::config("Cannot commit in a bare repository"))?;
        let workdir = workdir.canonicalize()?;
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        let absolute = absolute.canonicalize()?;

        absolute
            .strip_prefix(&workdir)
            .map(Path::to_path_buf)
            .map_err(|_| {
                ReleaseError::config(format!(
                    "File '{}' is outside of the repository",
                    path.display()
                ))
            })
    }

    fn signature(&self) -> Result<git2::Signature<'static>> {
        self.repo.signature().map_err(|e| {
            ReleaseError::config(format!(
                "Cannot determine the commit author (set user.name and user.email): {}",
                e
            ))
        })
    }
}

impl super::Repository for Git2Repository {
    fn remote_names(&self) -> Result<Vec<String>> {
        let remotes = self.repo.remotes()?;
        let mut names: Vec<String> = remotes.iter().flatten().map(str::to_string).collect();
        names.sort();
        Ok(names)
    }

    fn remote_branch_names(&self, remote: &str) -> Result<Vec<String>> {
        let prefix = format!("{}/", remote);
        let mut names = Vec::new();

        for branch in self.repo.branches(Some(BranchType::Remote))? {
            let (branch, _) = branch?;
            if let Some(name) = branch.name()? {
                if let Some(short) = name.strip_prefix(&prefix) {
                    if short != "HEAD" {
                        names.push(short.to_string());
                    }
                }
            }
        }

        names.sort();
        Ok(names)
    }

    fn remote_branch_oid(&self, remote: &str, branch: &str) -> Result<Option<Oid>> {
        let refname = RemoteRef::new(remote, branch).refname();
        match self.repo.find_reference(&refname) {
            Ok(reference) => Ok(Some(reference.peel_to_commit()?.id())),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn local_branch_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for branch in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = branch?;
            if let Some(name) = branch.name()? {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn get_branch_head_oid(&self, branch_name: &str) -> Result<Oid> {
        let branch = self
            .repo
            .find_branch(branch_name, BranchType::Local)
            .map_err(|_| ReleaseError::BranchNotFound(branch_name.to_string()))?;

        let commit = branch.into_reference().peel_to_commit()?;
        Ok(commit.id())
    }

    fn current_branch(&self) -> Result<Option<String>> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            Ok(head.shorthand().map(str::to_string))
        } else {
            Ok(None)
        }
    }

    fn tracking_branch(&self, branch: &str) -> Result<Option<String>> {
        self.repo
            .find_branch(branch, BranchType::Local)
            .map_err(|_| ReleaseError::BranchNotFound(branch.to_string()))?;

        // read the configuration, the upstream ref may not have been fetched yet
        let config = self.repo.config()?;
        let remote = config_entry(&config, &format!("branch.{}.remote", branch))?;
        let merge = config_entry(&config, &format!("branch.{}.merge", branch))?;
        let (Some(remote), Some(merge)) = (remote, merge) else {
            return Ok(None);
        };

        let refname = format!("refs/heads/{}", branch);
        let upstream = match self.repo.branch_upstream_name(&refname) {
            Ok(name) => name.as_str().map(shorten_upstream),
            Err(e) => {
                debug!(branch, error = %e, "Cannot resolve the upstream ref");
                None
            }
        };

        Ok(Some(upstream.unwrap_or_else(|| {
            let merged = merge.strip_prefix("refs/heads/").unwrap_or(&merge);
            format!("{}/{}", remote, merged)
        })))
    }

    fn set_tracking_branch(&self, branch: &str, upstream: &RemoteRef) -> Result<()> {
        let mut local = self
            .repo
            .find_branch(branch, BranchType::Local)
            .map_err(|_| ReleaseError::BranchNotFound(branch.to_string()))?;

        local.set_upstream(Some(&upstream.to_string()))?;
        Ok(())
    }

    fn set_branch_target(&self, branch: &str, oid: Oid, reflog_message: &str) -> Result<()> {
        let local = self
            .repo
            .find_branch(branch, BranchType::Local)
            .map_err(|_| ReleaseError::BranchNotFound(branch.to_string()))?;

        if local.is_head() {
            // move the working tree first, the safe checkout compares against the old HEAD
            let target = self.repo.find_commit(oid)?;
            self.repo
                .checkout_tree(target.as_object(), Some(CheckoutBuilder::new().safe()))?;
        }

        let mut reference = local.into_reference();
        reference.set_target(oid, reflog_message)?;
        Ok(())
    }

    fn create_branch(&self, branch: &str, oid: Oid) -> Result<()> {
        let commit = self.repo.find_commit(oid)?;
        self.repo.branch(branch, &commit, false)?;
        Ok(())
    }

    fn ahead_behind(&self, oid: Oid, base: Oid) -> Result<(usize, usize)> {
        Ok(self.repo.graph_ahead_behind(oid, base)?)
    }

    fn fetch(&self, remote_name: &str) -> Result<()> {
        let mut remote = self
            .repo
            .find_remote(remote_name)
            .map_err(|_| ReleaseError::InvalidRemote(remote_name.to_string()))?;

        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(|_url, username_from_url, allowed_types| {
            let username = username_from_url.unwrap_or("git");

            if allowed_types.contains(CredentialType::SSH_KEY) {
                if let Some(home) = dirs::home_dir() {
                    for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                        let path = home.join(".ssh").join(key);
                        if path.exists() {
                            if let Ok(cred) = Cred::ssh_key(username, None, &path, None) {
                                return Ok(cred);
                            }
                        }
                    }
                }

                if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                    return Ok(cred);
                }
            }

            Cred::default()
        });

        let mut fetch_options = git2::FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);

        let refspecs = fetch_refspecs(remote_name);

        debug!(remote = remote_name, "Fetching refs");
        remote
            .fetch(&refspecs, Some(&mut fetch_options), None)
            .map_err(|e| {
                ReleaseError::remote(format!(
                    "Failed to fetch from remote '{}': {}",
                    remote_name, e
                ))
            })?;

        Ok(())
    }

    fn checkout_branch(&self, branch: &str) -> Result<()> {
        let local = self
            .repo
            .find_branch(branch, BranchType::Local)
            .map_err(|_| ReleaseError::BranchNotFound(branch.to_string()))?;

        if local.is_head() {
            return Ok(());
        }

        let reference = local.into_reference();
        let refname = reference
            .name()
            .ok_or_else(|| ReleaseError::config(format!("Invalid branch name '{}'", branch)))?
            .to_string();
        let target = reference.peel_to_commit()?;

        self.repo
            .checkout_tree(target.as_object(), Some(CheckoutBuilder::new().safe()))?;
        self.repo.set_head(&refname)?;
        Ok(())
    }

    fn is_dirty(&self) -> Result<bool> {
        let mut options = StatusOptions::new();
        options.include_untracked(false).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(statuses
            .iter()
            .any(|entry| entry.status() != git2::Status::CURRENT))
    }

    fn commit_paths(&self, paths: &[PathBuf], message: &str, sign_off: bool) -> Result<Oid> {
        let mut index = self.repo.index()?;
        for path in paths {
            index.add_path(&self.index_path(path)?)?;
        }
        index.write()?;

        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = self.signature()?;

        let message = if sign_off {
            format!(
                "{}\n\nSigned-off-by: {} <{}>\n",
                message.trim_end(),
                signature.name().unwrap_or("unknown"),
                signature.email().unwrap_or("unknown")
            )
        } else {
            message.to_string()
        };

        let parent = self.repo.head()?.peel_to_commit()?;
        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            &message,
            &tree,
            &[&parent],
        )?;

        Ok(oid)
    }

    fn create_tag(&self, name: &str, message: Option<&str>) -> Result<()> {
        let head = self.repo.head()?.peel_to_commit()?;

        match message {
            Some(message) => {
                let signature = self.signature()?;
                self.repo
                    .tag(name, head.as_object(), &signature, message, false)?;
            }
            None => {
                self.repo.tag_lightweight(name, head.as_object(), false)?;
            }
        }

        Ok(())
    }
}

/// Branches are mirrored forcibly, tags only when they do not clash with a local tag.
fn fetch_refspecs(remote: &str) -> [String; 2] {
    [
        format!("+refs/heads/*:refs/remotes/{}/*", remote),
        "refs/tags/*:refs/tags/*".to_string(),
    ]
}

fn config_entry(config: &git2::Config, key: &str) -> Result<Option<String>> {
    match config.get_string(key) {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// `refs/remotes/origin/main` becomes `origin/main`
fn shorten_upstream(refname: &str) -> String {
    refname
        .strip_prefix("refs/remotes/")
        .or_else(|| refname.strip_prefix("refs/heads/"))
        .unwrap_or(refname)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::Repository;
    use tempfile::TempDir;

    #[test]
    fn test_open_outside_repository_fails() {
        let dir = TempDir::new().unwrap();
        let result = Git2Repository::open(dir.path().join("missing"));
        assert!(result.is_err());
    }

    #[test]
    fn test_fetch_does_not_force_tags() {
        let [heads, tags] = fetch_refspecs("origin");
        assert_eq!(heads, "+refs/heads/*:refs/remotes/origin/*");
        assert!(!tags.starts_with('+'));
    }

    #[test]
    fn test_shorten_upstream() {
        assert_eq!(shorten_upstream("refs/remotes/origin/release/1.0"), "origin/release/1.0");
        assert_eq!(shorten_upstream("refs/heads/main"), "main");
    }

    #[test]
    fn test_empty_repository() {
        let dir = TempDir::new().unwrap();
        let repo = Git2Repository::from_git2(Git2Repo::init(dir.path()).unwrap());

        assert!(repo.remote_names().unwrap().is_empty());
        assert!(repo.local_branch_names().unwrap().is_empty());
        assert_eq!(repo.current_branch().unwrap(), None);
        assert!(!repo.is_dirty().unwrap());
    }
}
