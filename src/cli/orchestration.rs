//! Main release workflow orchestration logic
//!
//! Keeps the release steps apart from CLI argument parsing, so the workflow can be
//! driven programmatically with any [Repository] and [Selector].

use std::path::PathBuf;

use git2::Oid;
use tracing::{debug, info};

use crate::boundary::BoundaryWarning;
use crate::config::Config;
use crate::error::{ReleaseError, Result};
use crate::git::Repository;
use crate::resolver::{resolve_release_branch, ResolveOptions};
use crate::template::Template;
use crate::ui::{self, Selector};
use crate::validation::VersionConvention;
use crate::version_file::VersionFile;

/// Arguments for the release workflow
///
/// Mirrors the CLI Args but in a format suitable for orchestration logic.
/// This decoupling allows the workflow to be called programmatically
/// without depending on clap.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReleaseWorkflowArgs {
    /// Explicitly specified git remote
    pub remote: Option<String>,

    /// Explicitly specified development branch
    pub development: Option<String>,

    /// Explicitly specified release branch
    pub release: Option<String>,

    /// New version, prompted for when absent
    pub new_version: Option<String>,

    /// Fetch the remote before resolving branches
    pub fetch: bool,

    /// Bring the branches in line with the remote
    pub update: bool,

    /// Allow overriding tracking branches and resetting diverged branches
    pub force_update: bool,

    /// Skip confirmation prompts
    pub yes: bool,
}

/// Result of a successful release workflow
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowResult {
    /// The remote the branches were reconciled with
    pub remote: Option<String>,

    pub development_branch: String,

    /// The branch holding the release commit, checked out
    pub release_branch: String,

    /// Version found in the version files before the release
    pub previous_version: Option<String>,

    pub version: String,

    /// The version bump commit, `None` when no file changed
    pub commit: Option<Oid>,

    /// The tag that was created
    pub tag: Option<String>,

    /// Warnings shown during the run
    pub warnings: Vec<BoundaryWarning>,
}

/// The version every file agrees on, `None` without version files.
pub fn current_version(files: &[VersionFile]) -> Result<Option<String>> {
    let mut found: Vec<(PathBuf, String)> = Vec::with_capacity(files.len());
    for file in files {
        found.push((file.path().to_path_buf(), file.version()?));
    }

    let Some((_, first)) = found.first() else {
        return Ok(None);
    };

    if found.iter().any(|(_, version)| version != first) {
        return Err(ReleaseError::VersionMismatch {
            versions: found
                .iter()
                .map(|(path, version)| format!("{}: {}", path.display(), version))
                .collect(),
        });
    }

    Ok(Some(first.clone()))
}

/// Check a candidate version against the configured convention.
pub fn validate_version(convention: VersionConvention, version: &str) -> std::result::Result<(), String> {
    if version.is_empty() {
        return Err("The version string must not be empty".to_string());
    }
    convention.validate(version)
}

/// Write `version` to every file and read it back.
pub fn write_version(files: &[VersionFile], version: &str) -> Result<()> {
    for file in files {
        debug!(path = %file.path().display(), version, "Writing version");
        file.set_version(version)?;
    }

    for file in files {
        let written = file.version()?;
        if written != version {
            return Err(ReleaseError::config(format!(
                "Version file '{}' reads '{}' after writing '{}'",
                file.path().display(),
                written,
                version
            )));
        }
    }

    Ok(())
}

fn warn(warnings: &mut Vec<BoundaryWarning>, warning: BoundaryWarning) {
    ui::display_warning(&warning);
    warnings.push(warning);
}

/// Main release workflow
///
/// Orchestrates the entire release:
/// 1. Check the working tree
/// 2. Resolve, update and check out the release branch
/// 3. Read the current version from the version files
/// 4. Choose the new version
/// 5. Write the new version to the version files
/// 6. Commit the version files and create the tag
///
/// # Arguments
///
/// * `args` - Workflow arguments (remote, branches, version, update policy)
/// * `config` - Release configuration
/// * `repo` - The repository to release
/// * `selector` - Makes the choices the arguments and configuration left open
///
/// # Returns
///
/// Result containing the release info or error
pub fn run_release_workflow<R, S>(
    args: &ReleaseWorkflowArgs,
    config: &Config,
    repo: &R,
    selector: &S,
) -> Result<WorkflowResult>
where
    R: Repository + ?Sized,
    S: Selector + ?Sized,
{
    let mut warnings = Vec::new();

    let commit_message = Template::parse(&config.git.commit.message)?;
    let tag_format = Template::parse(&config.git.tag.format)?;
    let tag_message = Template::parse(&config.git.tag.message)?;

    if repo.is_dirty()? {
        warn(&mut warnings, BoundaryWarning::DirtyWorkingTree);
        if !args.yes && !selector.confirm("Continue with uncommitted changes?")? {
            return Err(ReleaseError::Cancelled);
        }
    }

    let options = ResolveOptions {
        remote: args.remote.clone(),
        development: args.development.clone(),
        release: args.release.clone(),
        development_branches: config.git.branch.development.clone(),
        release_branches: config.git.branch.release.clone(),
        fetch: args.fetch && args.update,
        update: args.update,
        force_update: args.force_update,
    };
    let resolved = resolve_release_branch(repo, &options, selector)?;
    info!("Releasing from the {} branch", resolved.release);

    let files = &config.file.version;
    if files.is_empty() {
        warn(&mut warnings, BoundaryWarning::NoVersionFiles);
    }
    let previous_version = current_version(files)?;

    let convention = config.convention.version;
    let validate = |version: &str| validate_version(convention, version);
    let version = match &args.new_version {
        Some(version) => version.clone(),
        None => selector.select_version(previous_version.as_deref(), &validate)?,
    };
    validate(&version).map_err(ReleaseError::InvalidVersion)?;

    let commit = if previous_version.as_deref() == Some(version.as_str()) {
        warn(
            &mut warnings,
            BoundaryWarning::UnchangedVersion {
                version: version.clone(),
            },
        );
        None
    } else if files.is_empty() {
        None
    } else {
        write_version(files, &version)?;

        if config.git.commit.gpg_sign {
            warn(
                &mut warnings,
                BoundaryWarning::SigningUnsupported {
                    object: "commit".to_string(),
                },
            );
        }

        let paths: Vec<PathBuf> = files.iter().map(|file| file.path().to_path_buf()).collect();
        let message = commit_message.render(&version);
        let oid = repo.commit_paths(&paths, &message, config.git.commit.sign_off)?;
        info!("Committed version {} as {}", version, oid);
        Some(oid)
    };

    if config.git.tag.gpg_sign {
        warn(
            &mut warnings,
            BoundaryWarning::SigningUnsupported {
                object: "tag".to_string(),
            },
        );
    }

    let tag = tag_format.render(&version);
    let annotation = config
        .git
        .tag
        .annotate
        .then(|| tag_message.render(&version));
    repo.create_tag(&tag, annotation.as_deref())?;
    info!("Created tag {}", tag);

    Ok(WorkflowResult {
        remote: resolved.remote,
        development_branch: resolved.development,
        release_branch: resolved.release,
        previous_version,
        version,
        commit,
        tag: Some(tag),
        warnings,
    })
}
