// tests/cli_orchestration_test.rs
mod common;

use git2::{ObjectType, Oid};
use project_release::boundary::BoundaryWarning;
use project_release::cli::{run_release_workflow, ReleaseWorkflowArgs};
use project_release::config::Config;
use project_release::git::{Git2Repository, MockRepository, Repository};
use project_release::ui::{Selector, Validator};
use project_release::validation::VersionConvention;
use project_release::version_file::VersionFile;
use project_release::{ReleaseError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Answers every prompt with fixed values
struct FixedSelector {
    version: Option<String>,
    confirm: bool,
}

impl FixedSelector {
    fn new() -> Self {
        FixedSelector {
            version: None,
            confirm: true,
        }
    }
}

impl Selector for FixedSelector {
    fn select_remote(&self, remotes: &[String]) -> Result<String> {
        remotes.first().cloned().ok_or(ReleaseError::Cancelled)
    }

    fn select_branch(
        &self,
        _description: &str,
        candidates: &[String],
        default: Option<&str>,
        _validate: Validator<'_>,
    ) -> Result<String> {
        default
            .map(str::to_string)
            .or_else(|| candidates.first().cloned())
            .ok_or(ReleaseError::Cancelled)
    }

    fn select_version(&self, _current: Option<&str>, validate: Validator<'_>) -> Result<String> {
        let version = self.version.clone().ok_or(ReleaseError::Cancelled)?;
        validate(&version).map_err(ReleaseError::InvalidVersion)?;
        Ok(version)
    }

    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(self.confirm)
    }
}

fn oid(n: u8) -> Oid {
    Oid::from_bytes(&[n; 20]).unwrap()
}

fn mock_repo() -> MockRepository {
    let repo = MockRepository::new();
    repo.add_commit(oid(1), &[]);
    repo.set_branch_head("main", oid(1));
    repo.set_head("main");
    repo
}

fn version_file(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("VERSION");
    fs::write(&path, content).unwrap();
    path
}

fn config_with(path: &Path) -> Config {
    let mut config = Config::default();
    config.file.version = vec![VersionFile::plain(path)];
    config.git.branch.development = vec!["main".to_string()];
    config.git.branch.release = vec!["release/*".to_string()];
    config
}

fn release_args(version: &str) -> ReleaseWorkflowArgs {
    ReleaseWorkflowArgs {
        release: Some("release/1.1".to_string()),
        new_version: Some(version.to_string()),
        fetch: true,
        update: true,
        ..Default::default()
    }
}

#[test]
fn test_release_with_mock_repository() {
    let dir = TempDir::new().unwrap();
    let path = version_file(&dir, "1.0.0\n");
    let repo = mock_repo();

    let result = run_release_workflow(
        &release_args("1.1.0"),
        &config_with(&path),
        &repo,
        &FixedSelector::new(),
    )
    .unwrap();

    assert_eq!(result.remote, None);
    assert_eq!(result.development_branch, "main");
    assert_eq!(result.release_branch, "release/1.1");
    assert_eq!(result.previous_version.as_deref(), Some("1.0.0"));
    assert_eq!(result.version, "1.1.0");
    assert_eq!(result.tag.as_deref(), Some("1.1.0"));
    assert!(result.warnings.is_empty());

    assert_eq!(fs::read_to_string(&path).unwrap(), "1.1.0\n");

    let commits = repo.commits();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].branch, "release/1.1");
    assert_eq!(commits[0].message, "bump: version 1.1.0");
    assert_eq!(commits[0].paths, vec![path.clone()]);
    assert_eq!(result.commit, Some(commits[0].oid));

    // the development branch is left where it was
    assert_eq!(repo.branch_head("main"), Some(oid(1)));
    assert_eq!(
        repo.tags().get("1.1.0"),
        Some(&Some("version 1.1.0".to_string()))
    );
}

#[test]
fn test_invalid_version_stops_before_writing() {
    let dir = TempDir::new().unwrap();
    let path = version_file(&dir, "1.0.0\n");
    let repo = mock_repo();
    let mut config = config_with(&path);
    config.convention.version = VersionConvention::Semver;

    let err = run_release_workflow(&release_args("1.1"), &config, &repo, &FixedSelector::new())
        .unwrap_err();

    assert_eq!(err.to_string(), "Invalid semver version string: '1.1'");
    assert_eq!(fs::read_to_string(&path).unwrap(), "1.0.0\n");
    assert!(repo.commits().is_empty());
    assert!(repo.tags().is_empty());
}

#[test]
fn test_dirty_tree_declined() {
    let dir = TempDir::new().unwrap();
    let path = version_file(&dir, "1.0.0\n");
    let repo = mock_repo();
    repo.set_dirty(true);
    let selector = FixedSelector {
        version: None,
        confirm: false,
    };

    let err = run_release_workflow(&release_args("1.1.0"), &config_with(&path), &repo, &selector)
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(repo.branch_head("release/1.1"), None);
}

#[test]
fn test_dirty_tree_accepted_with_yes() {
    let dir = TempDir::new().unwrap();
    let path = version_file(&dir, "1.0.0\n");
    let repo = mock_repo();
    repo.set_dirty(true);
    let selector = FixedSelector {
        version: None,
        confirm: false,
    };
    let mut args = release_args("1.1.0");
    args.yes = true;

    let result = run_release_workflow(&args, &config_with(&path), &repo, &selector).unwrap();
    assert_eq!(result.warnings, vec![BoundaryWarning::DirtyWorkingTree]);
}

#[test]
fn test_unchanged_version_only_tags() {
    let dir = TempDir::new().unwrap();
    let path = version_file(&dir, "1.0.0\n");
    let repo = mock_repo();

    let result = run_release_workflow(
        &release_args("1.0.0"),
        &config_with(&path),
        &repo,
        &FixedSelector::new(),
    )
    .unwrap();

    assert_eq!(result.commit, None);
    assert_eq!(
        result.warnings,
        vec![BoundaryWarning::UnchangedVersion {
            version: "1.0.0".to_string()
        }]
    );
    assert!(repo.commits().is_empty());
    assert!(repo.tags().contains_key("1.0.0"));
}

#[test]
fn test_without_version_files_prompts_for_version() {
    let repo = mock_repo();
    let mut config = Config::default();
    config.git.branch.development = vec!["main".to_string()];
    config.git.tag.format = "v%(version)s".to_string();
    config.git.tag.annotate = false;
    let selector = FixedSelector {
        version: Some("0.2.0".to_string()),
        confirm: true,
    };
    let args = ReleaseWorkflowArgs {
        release: Some("stable".to_string()),
        ..Default::default()
    };

    let result = run_release_workflow(&args, &config, &repo, &selector).unwrap();

    assert_eq!(result.previous_version, None);
    assert_eq!(result.version, "0.2.0");
    assert_eq!(result.commit, None);
    assert_eq!(result.warnings, vec![BoundaryWarning::NoVersionFiles]);
    // lightweight tag
    assert_eq!(repo.tags().get("v0.2.0"), Some(&None));
}

#[test]
fn test_signing_requests_warn() {
    let dir = TempDir::new().unwrap();
    let path = version_file(&dir, "1.0.0\n");
    let repo = mock_repo();
    let mut config = config_with(&path);
    config.git.commit.gpg_sign = true;
    config.git.tag.gpg_sign = true;

    let result =
        run_release_workflow(&release_args("1.1.0"), &config, &repo, &FixedSelector::new())
            .unwrap();

    assert_eq!(
        result.warnings,
        vec![
            BoundaryWarning::SigningUnsupported {
                object: "commit".to_string()
            },
            BoundaryWarning::SigningUnsupported {
                object: "tag".to_string()
            },
        ]
    );
}

#[test]
fn test_mismatched_version_files() {
    let dir = TempDir::new().unwrap();
    let first = version_file(&dir, "1.0.0\n");
    let second = dir.path().join("version.txt");
    fs::write(&second, "v0.9.0").unwrap();

    let repo = mock_repo();
    let mut config = config_with(&first);
    config
        .file
        .version
        .push(VersionFile::formatted(&second, "v%(version)s").unwrap());

    let err = run_release_workflow(&release_args("1.1.0"), &config, &repo, &FixedSelector::new())
        .unwrap_err();
    assert!(matches!(err, ReleaseError::VersionMismatch { .. }));
    assert_eq!(fs::read_to_string(&first).unwrap(), "1.0.0\n");
}

#[test]
fn test_release_in_real_repository() {
    let remote = common::Remote::new();
    let repo = Git2Repository::open(remote.clone_dir.path()).unwrap();
    let path = remote.clone_dir.path().join("VERSION");

    let mut config = config_with(&path);
    config.git.tag.format = "v%(version)s".to_string();
    config.git.commit.sign_off = true;

    let result =
        run_release_workflow(&release_args("1.1.0"), &config, &repo, &FixedSelector::new())
            .unwrap();

    assert_eq!(result.remote.as_deref(), Some("origin"));
    assert_eq!(repo.current_branch().unwrap().as_deref(), Some("release/1.1"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "1.1.0\n");
    assert!(!repo.is_dirty().unwrap());

    let commit = remote
        .clone
        .find_commit(result.commit.unwrap())
        .unwrap();
    let message = commit.message().unwrap();
    assert!(message.starts_with("bump: version 1.1.0"));
    assert!(message.contains("Signed-off-by: Release Tester <tester@example.com>"));

    let tag = remote
        .clone
        .revparse_single("refs/tags/v1.1.0")
        .unwrap();
    assert_eq!(tag.kind(), Some(ObjectType::Tag));
    assert_eq!(tag.peel_to_commit().unwrap().id(), commit.id());

    // the release branch has not been pushed, so it tracks nothing yet
    assert_eq!(repo.tracking_branch("release/1.1").unwrap(), None);
    assert_eq!(
        repo.tracking_branch("main").unwrap().as_deref(),
        Some("origin/main")
    );
}
