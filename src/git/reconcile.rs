//! Bring local branches in line with their remote counterparts.
//!
//! Only two changes happen without consent: configuring a missing tracking branch
//! and fast-forwarding a branch that is strictly behind. Anything that would
//! discard history needs `force_update`.

use git2::Oid;
use tracing::{debug, info, warn};

use crate::error::{ReleaseError, Result};
use crate::git::compare::{compare_refs, RefPosition};
use crate::git::{RemoteRef, Repository};

/// What [update_branch] did to the local branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchUpdate {
    /// The branch does not exist on the remote yet
    NotOnRemote,
    /// Same history as the remote branch
    UpToDate,
    /// Local commits not yet pushed, left untouched
    Ahead,
    /// Moved forward to the remote commit
    FastForwarded { from: Oid, to: Oid },
    /// Reset to the remote commit, discarding the local history
    ForceReset { from: Oid, to: Oid },
}

/// Update a local branch from the remote branch of the same name.
///
/// # Arguments
/// * `branch` - The local branch name
/// * `remote` - The remote the branch should track
/// * `force_update` - Allow overriding the tracking branch and resetting diverged history
///
/// # Errors
/// * [ReleaseError::TrackingMismatch] - The branch tracks another ref and `force_update` is off
/// * [ReleaseError::UnrelatedHistory] - Both sides have commits of their own and `force_update` is off
pub fn update_branch<R: Repository + ?Sized>(
    repo: &R,
    branch: &str,
    remote: &str,
    force_update: bool,
) -> Result<BranchUpdate> {
    let Some(remote_oid) = repo.remote_branch_oid(remote, branch)? else {
        debug!("The {} branch does not yet exist on {}", branch, remote);
        return Ok(BranchUpdate::NotOnRemote);
    };

    let expected = RemoteRef::new(remote, branch);

    match repo.tracking_branch(branch)? {
        None => {
            debug!("Configuring the {} branch to track {}", branch, expected);
            repo.set_tracking_branch(branch, &expected)?;
        }
        Some(tracking) if tracking != expected.to_string() => {
            if !force_update {
                return Err(ReleaseError::TrackingMismatch {
                    branch: branch.to_string(),
                    tracking,
                    expected: expected.to_string(),
                });
            }
            warn!("Configuring the {} branch to track {}", branch, expected);
            repo.set_tracking_branch(branch, &expected)?;
        }
        Some(_) => {}
    }

    let local_oid = repo.get_branch_head_oid(branch)?;

    match compare_refs(repo, local_oid, remote_oid)? {
        RefPosition::Equal => {
            debug!("The {} branch is up to date with {}", branch, expected);
            Ok(BranchUpdate::UpToDate)
        }
        RefPosition::Ahead => {
            debug!("The {} branch is ahead of {}", branch, expected);
            Ok(BranchUpdate::Ahead)
        }
        RefPosition::Behind => {
            info!("Updating the {} branch to match {}", branch, expected);
            repo.set_branch_target(
                branch,
                remote_oid,
                &format!("fast-forward from {}", expected),
            )?;
            Ok(BranchUpdate::FastForwarded {
                from: local_oid,
                to: remote_oid,
            })
        }
        RefPosition::Unrelated => {
            if !force_update {
                return Err(ReleaseError::UnrelatedHistory {
                    branch: branch.to_string(),
                    tracking: expected.to_string(),
                });
            }
            warn!("Forcing the {} branch to match {}", branch, expected);
            repo.set_branch_target(branch, remote_oid, &format!("reset to {}", expected))?;
            Ok(BranchUpdate::ForceReset {
                from: local_oid,
                to: remote_oid,
            })
        }
    }
}

/// Create a local branch.
///
/// When the remote has a branch of the same name, the new branch starts from it and
/// tracks it. Otherwise the branch starts at `default_oid`.
pub fn create_branch<R: Repository + ?Sized>(
    repo: &R,
    branch: &str,
    default_oid: Oid,
    remote: Option<&str>,
) -> Result<Oid> {
    if let Some(remote) = remote {
        if let Some(remote_oid) = repo.remote_branch_oid(remote, branch)? {
            let upstream = RemoteRef::new(remote, branch);
            info!("Creating the {} branch from {}", branch, upstream);
            repo.create_branch(branch, remote_oid)?;
            repo.set_tracking_branch(branch, &upstream)?;
            return Ok(remote_oid);
        }
    }

    info!("Creating the {} branch at {}", branch, default_oid);
    repo.create_branch(branch, default_oid)?;
    Ok(default_oid)
}
