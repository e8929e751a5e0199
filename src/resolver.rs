//! Resolve the remote and the development/release branches of a release.
//!
//! Choices the caller did not make are made automatically when only one answer is
//! possible, and handed to a [Selector] otherwise.

use tracing::{debug, info};

use crate::domain::BranchPatterns;
use crate::error::{ReleaseError, Result};
use crate::git::{create_branch, update_branch, Repository};
use crate::ui::Selector;

/// Hints and policy for [resolve_release_branch]
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Remote requested by the user
    pub remote: Option<String>,
    /// Development branch requested by the user
    pub development: Option<String>,
    /// Release branch requested by the user
    pub release: Option<String>,
    /// Allowed development branch names, plain or glob patterns
    pub development_branches: Vec<String>,
    /// Allowed release branch names, plain or glob patterns
    pub release_branches: Vec<String>,
    pub fetch: bool,
    pub update: bool,
    pub force_update: bool,
}

/// Outcome of [resolve_release_branch]; the release branch is checked out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBranches {
    pub remote: Option<String>,
    pub development: String,
    pub release: String,
}

/// Select the remote to use.
///
/// A requested remote must exist. Without a request, a repository without remotes
/// yields `None` and a single remote is used as is.
pub fn select_remote<R, S>(repo: &R, hint: Option<&str>, selector: &S) -> Result<Option<String>>
where
    R: Repository + ?Sized,
    S: Selector + ?Sized,
{
    let remotes = repo.remote_names()?;

    if let Some(hint) = hint {
        if !remotes.iter().any(|remote| remote == hint) {
            return Err(ReleaseError::InvalidRemote(hint.to_string()));
        }
        return Ok(Some(hint.to_string()));
    }

    match remotes.as_slice() {
        [] => Ok(None),
        [only] => Ok(Some(only.clone())),
        _ => {
            let selected = selector.select_remote(&remotes)?;
            if !remotes.contains(&selected) {
                return Err(ReleaseError::InvalidRemote(selected));
            }
            Ok(Some(selected))
        }
    }
}

/// Select a branch name among the configured ones.
///
/// # Arguments
/// * `description` - Which branch is resolved, used in prompts
/// * `allowed` - Configured plain names and patterns
/// * `repo_branches` - Branch names known to the repository, matching ones are offered
/// * `hint` - Branch requested by the user, must be allowed
/// * `default` - Answer proposed by the prompt
pub fn select_branch_name<S: Selector + ?Sized>(
    description: &str,
    allowed: &BranchPatterns,
    repo_branches: &[String],
    hint: Option<&str>,
    default: Option<&str>,
    selector: &S,
) -> Result<String> {
    if let Some(hint) = hint {
        if !allowed.matches(hint) {
            return Err(ReleaseError::InvalidBranch(hint.to_string()));
        }
        return Ok(hint.to_string());
    }

    if let Some(single) = allowed.single() {
        debug!("Using the only configured {} branch {}", description, single);
        return Ok(single.to_string());
    }

    let candidates = allowed.candidates(repo_branches);
    let validate = |name: &str| allowed.validate(name);
    let selected = selector.select_branch(description, &candidates, default, &validate)?;

    allowed
        .validate(&selected)
        .map_err(|_| ReleaseError::InvalidBranch(selected.clone()))?;
    Ok(selected)
}

/// Local branches plus the branches of `remote`, sorted and deduplicated.
fn repo_branch_names<R: Repository + ?Sized>(repo: &R, remote: Option<&str>) -> Result<Vec<String>> {
    let mut names = repo.local_branch_names()?;
    if let Some(remote) = remote {
        names.extend(repo.remote_branch_names(remote)?);
    }
    names.sort();
    names.dedup();
    Ok(names)
}

/// Resolve, update and check out the release branch.
///
/// 1. Select the remote and fetch it (fetching needs `update`).
/// 2. Select the development and release branch names. The development prompt
///    defaults to the current branch.
/// 3. The development branch must exist locally and is reconciled with the remote.
/// 4. A missing release branch is created from the remote branch of the same name,
///    or from the development branch. An existing one is reconciled.
/// 5. The release branch is checked out.
pub fn resolve_release_branch<R, S>(
    repo: &R,
    options: &ResolveOptions,
    selector: &S,
) -> Result<ResolvedBranches>
where
    R: Repository + ?Sized,
    S: Selector + ?Sized,
{
    let remote = select_remote(repo, options.remote.as_deref(), selector)?;
    let update = remote.is_some() && options.update;

    if let Some(remote) = remote.as_deref() {
        if options.fetch && options.update {
            info!("Fetching from {}", remote);
            repo.fetch(remote)?;
        }
    }

    let repo_branches = repo_branch_names(repo, remote.as_deref())?;
    let current = repo.current_branch()?;

    let development_allowed = BranchPatterns::new(&options.development_branches)?;
    let development = select_branch_name(
        "development",
        &development_allowed,
        &repo_branches,
        options.development.as_deref(),
        current.as_deref(),
        selector,
    )?;

    let release_allowed = BranchPatterns::new(&options.release_branches)?;
    let release = select_branch_name(
        "release",
        &release_allowed,
        &repo_branches,
        options.release.as_deref(),
        None,
        selector,
    )?;

    if !repo.branch_exists(&development)? {
        return Err(ReleaseError::BranchNotFound(development));
    }
    if let (Some(remote), true) = (remote.as_deref(), update) {
        update_branch(repo, &development, remote, options.force_update)?;
    }

    if !repo.branch_exists(&release)? {
        let start = repo.get_branch_head_oid(&development)?;
        create_branch(repo, &release, start, remote.as_deref())?;
    } else if let (Some(remote), true) = (remote.as_deref(), update) {
        update_branch(repo, &release, remote, options.force_update)?;
    }

    debug!("Checking out the {} branch", release);
    repo.checkout_branch(&release)?;

    Ok(ResolvedBranches {
        remote,
        development,
        release,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::mock::{oid, MockRepository};
    use crate::ui::Validator;
    use std::cell::RefCell;

    /// Answers prompts from a script and records what was asked
    #[derive(Default)]
    struct ScriptedSelector {
        remote: Option<String>,
        branches: RefCell<Vec<String>>,
        asked: RefCell<Vec<(String, Vec<String>, Option<String>)>>,
    }

    impl ScriptedSelector {
        fn with_branches(branches: &[&str]) -> Self {
            ScriptedSelector {
                branches: RefCell::new(branches.iter().rev().map(|b| b.to_string()).collect()),
                ..Default::default()
            }
        }
    }

    impl Selector for ScriptedSelector {
        fn select_remote(&self, _remotes: &[String]) -> Result<String> {
            self.remote.clone().ok_or(ReleaseError::Cancelled)
        }

        fn select_branch(
            &self,
            description: &str,
            candidates: &[String],
            default: Option<&str>,
            _validate: Validator<'_>,
        ) -> Result<String> {
            self.asked.borrow_mut().push((
                description.to_string(),
                candidates.to_vec(),
                default.map(str::to_string),
            ));
            self.branches.borrow_mut().pop().ok_or(ReleaseError::Cancelled)
        }

        fn select_version(&self, _current: Option<&str>, _validate: Validator<'_>) -> Result<String> {
            Err(ReleaseError::Cancelled)
        }

        fn confirm(&self, _prompt: &str) -> Result<bool> {
            Ok(true)
        }
    }

    fn patterns(names: &[&str]) -> BranchPatterns {
        BranchPatterns::new(names).unwrap()
    }

    #[test]
    fn test_select_remote_hint_must_exist() {
        let repo = MockRepository::new();
        repo.add_remote("origin");
        let selector = ScriptedSelector::default();

        assert_eq!(
            select_remote(&repo, Some("origin"), &selector).unwrap(),
            Some("origin".to_string())
        );
        let err = select_remote(&repo, Some("upstream"), &selector).unwrap_err();
        assert_eq!(err.to_string(), "Invalid remote: 'upstream'");
    }

    #[test]
    fn test_select_remote_without_remotes() {
        let repo = MockRepository::new();
        assert_eq!(select_remote(&repo, None, &ScriptedSelector::default()).unwrap(), None);
    }

    #[test]
    fn test_select_single_remote_automatically() {
        let repo = MockRepository::new();
        repo.add_remote("origin");
        assert_eq!(
            select_remote(&repo, None, &ScriptedSelector::default()).unwrap(),
            Some("origin".to_string())
        );
    }

    #[test]
    fn test_select_remote_among_several_asks() {
        let repo = MockRepository::new();
        repo.add_remote("origin");
        repo.add_remote("upstream");
        let selector = ScriptedSelector {
            remote: Some("upstream".to_string()),
            ..Default::default()
        };
        assert_eq!(
            select_remote(&repo, None, &selector).unwrap(),
            Some("upstream".to_string())
        );
    }

    #[test]
    fn test_branch_hint_validated() {
        let selector = ScriptedSelector::default();
        let allowed = patterns(&["main", "release/*"]);

        let name =
            select_branch_name("release", &allowed, &[], Some("release/2.0"), None, &selector)
                .unwrap();
        assert_eq!(name, "release/2.0");

        let err = select_branch_name("release", &allowed, &[], Some("feature/x"), None, &selector)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid branch name: 'feature/x'");
    }

    #[test]
    fn test_single_plain_name_selected_without_prompt() {
        let selector = ScriptedSelector::default();
        let name =
            select_branch_name("development", &patterns(&["main"]), &[], None, None, &selector)
                .unwrap();
        assert_eq!(name, "main");
        assert!(selector.asked.borrow().is_empty());
    }

    #[test]
    fn test_pattern_match_alone_is_not_auto_selected() {
        let selector = ScriptedSelector::with_branches(&["release/1.0"]);
        let repo_branches = vec!["main".to_string(), "release/1.0".to_string()];

        let name = select_branch_name(
            "release",
            &patterns(&["release/*"]),
            &repo_branches,
            None,
            None,
            &selector,
        )
        .unwrap();

        assert_eq!(name, "release/1.0");
        let asked = selector.asked.borrow();
        assert_eq!(asked.len(), 1);
        assert_eq!(asked[0].1, vec!["release/1.0".to_string()]);
    }

    #[test]
    fn test_candidates_include_plain_names() {
        let selector = ScriptedSelector::with_branches(&["stable"]);
        let repo_branches = vec!["release/1.0".to_string()];

        select_branch_name(
            "release",
            &patterns(&["stable", "release/*"]),
            &repo_branches,
            None,
            Some("stable"),
            &selector,
        )
        .unwrap();

        let asked = selector.asked.borrow();
        assert_eq!(
            asked[0].1,
            vec!["release/1.0".to_string(), "stable".to_string()]
        );
        assert_eq!(asked[0].2.as_deref(), Some("stable"));
    }

    /// main at 2 on both sides, origin also has release/1.0 at 1
    fn repository() -> MockRepository {
        let repo = MockRepository::new();
        repo.add_commit(oid(1), &[]);
        repo.add_commit(oid(2), &[oid(1)]);
        repo.set_branch_head("main", oid(2));
        repo.set_head("main");
        repo.set_remote_branch("origin", "main", oid(2));
        repo.set_remote_branch("origin", "release/1.0", oid(1));
        repo
    }

    fn options() -> ResolveOptions {
        ResolveOptions {
            development_branches: vec!["main".to_string()],
            release_branches: vec!["release/*".to_string()],
            fetch: true,
            update: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_release_branch_created_from_remote() {
        let repo = repository();
        let selector = ScriptedSelector::with_branches(&["release/1.0"]);

        let resolved = resolve_release_branch(&repo, &options(), &selector).unwrap();

        assert_eq!(
            resolved,
            ResolvedBranches {
                remote: Some("origin".to_string()),
                development: "main".to_string(),
                release: "release/1.0".to_string(),
            }
        );
        assert_eq!(repo.fetches(), vec!["origin".to_string()]);
        assert_eq!(repo.branch_head("release/1.0"), Some(oid(1)));
        assert_eq!(repo.upstream_of("release/1.0").as_deref(), Some("origin/release/1.0"));
        assert_eq!(repo.upstream_of("main").as_deref(), Some("origin/main"));
        assert_eq!(repo.current_branch().unwrap().as_deref(), Some("release/1.0"));
    }

    #[test]
    fn test_new_release_branch_starts_at_development() {
        let repo = repository();
        let mut options = options();
        options.release = Some("release/2.0".to_string());

        let resolved =
            resolve_release_branch(&repo, &options, &ScriptedSelector::default()).unwrap();

        assert_eq!(resolved.release, "release/2.0");
        assert_eq!(repo.branch_head("release/2.0"), Some(oid(2)));
        assert_eq!(repo.upstream_of("release/2.0"), None);
    }

    #[test]
    fn test_existing_release_branch_fast_forwarded() {
        let repo = repository();
        repo.add_commit(oid(3), &[oid(1)]);
        repo.set_remote_branch("origin", "release/1.0", oid(3));
        repo.set_branch_head("release/1.0", oid(1));

        let mut options = options();
        options.release = Some("release/1.0".to_string());
        resolve_release_branch(&repo, &options, &ScriptedSelector::default()).unwrap();

        assert_eq!(repo.branch_head("release/1.0"), Some(oid(3)));
    }

    #[test]
    fn test_no_update_skips_fetch_and_reconciliation() {
        let repo = repository();
        repo.add_commit(oid(3), &[oid(2)]);
        repo.set_remote_branch("origin", "main", oid(3));

        let mut options = options();
        options.update = false;
        options.release = Some("release/2.0".to_string());
        resolve_release_branch(&repo, &options, &ScriptedSelector::default()).unwrap();

        assert!(repo.fetches().is_empty());
        assert_eq!(repo.branch_head("main"), Some(oid(2)));
        assert_eq!(repo.upstream_of("main"), None);
    }

    #[test]
    fn test_missing_development_branch() {
        let repo = repository();
        let mut options = options();
        options.development_branches = vec!["develop".to_string()];
        options.release = Some("release/2.0".to_string());

        let err = resolve_release_branch(&repo, &options, &ScriptedSelector::default())
            .unwrap_err();
        assert!(matches!(err, ReleaseError::BranchNotFound(ref name) if name == "develop"));
        assert_eq!(repo.branch_head("release/2.0"), None);
    }

    #[test]
    fn test_without_remote() {
        let repo = MockRepository::new();
        repo.add_commit(oid(1), &[]);
        repo.set_branch_head("main", oid(1));
        repo.set_head("main");

        let mut options = options();
        options.release = Some("release/1.0".to_string());
        let resolved =
            resolve_release_branch(&repo, &options, &ScriptedSelector::default()).unwrap();

        assert_eq!(resolved.remote, None);
        assert_eq!(repo.branch_head("release/1.0"), Some(oid(1)));
        assert!(repo.fetches().is_empty());
    }
}
