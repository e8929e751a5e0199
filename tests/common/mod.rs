// Helpers building real repositories in temporary directories
#![allow(dead_code)]

use git2::{Oid, Repository, RepositoryInitOptions, Signature};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub fn signature() -> Signature<'static> {
    Signature::now("Release Tester", "tester@example.com").unwrap()
}

/// A repository whose default branch is `main`
pub fn init_repo(dir: &Path) -> Repository {
    let mut options = RepositoryInitOptions::new();
    options.initial_head("main");
    let repo = Repository::init_opts(dir, &options).unwrap();
    set_identity(&repo);
    repo
}

pub fn set_identity(repo: &Repository) {
    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Release Tester").unwrap();
    config.set_str("user.email", "tester@example.com").unwrap();
}

/// Write a file and commit it on top of HEAD
pub fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) -> Oid {
    let workdir = repo.workdir().unwrap();
    fs::write(workdir.join(name), content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

    let parents = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().unwrap()],
        Err(_) => Vec::new(),
    };
    let parents: Vec<&git2::Commit> = parents.iter().collect();

    let sig = signature();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

/// Create a branch at HEAD without checking it out
pub fn branch_at_head(repo: &Repository, name: &str) {
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    repo.branch(name, &head, false).unwrap();
}

/// An origin repository with one commit on `main` and a clone of it
pub struct Remote {
    pub origin_dir: TempDir,
    pub clone_dir: TempDir,
    pub origin: Repository,
    pub clone: Repository,
}

impl Remote {
    pub fn new() -> Self {
        let origin_dir = TempDir::new().unwrap();
        let origin = init_repo(origin_dir.path());
        commit_file(&origin, "VERSION", "1.0.0\n", "initial commit");

        let clone_dir = TempDir::new().unwrap();
        let clone = Repository::clone(origin_dir.path().to_str().unwrap(), clone_dir.path()).unwrap();
        set_identity(&clone);

        Remote {
            origin_dir,
            clone_dir,
            origin,
            clone,
        }
    }

    pub fn clone_head(&self, branch: &str) -> Oid {
        self.clone
            .find_branch(branch, git2::BranchType::Local)
            .unwrap()
            .get()
            .peel_to_commit()
            .unwrap()
            .id()
    }
}
