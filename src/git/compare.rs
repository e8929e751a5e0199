use git2::Oid;

use crate::error::Result;
use crate::git::Repository;

/// The position of a ref in comparison to a base ref
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefPosition {
    /// The ref has commits the base ref does not have, and nothing is missing
    Ahead,
    /// The ref and the base ref point to the same history
    Equal,
    /// The base ref has commits the ref does not have, and nothing is extra
    Behind,
    /// Both sides have commits of their own.
    ///
    /// Diverged and disjoint histories are not told apart: either way the only
    /// safe recovery is an explicit forced update.
    Unrelated,
}

impl RefPosition {
    /// Classify from the commit counts in both directions.
    pub fn from_counts(ahead: usize, behind: usize) -> Self {
        match (ahead, behind) {
            (0, 0) => RefPosition::Equal,
            (_, 0) => RefPosition::Ahead,
            (0, _) => RefPosition::Behind,
            _ => RefPosition::Unrelated,
        }
    }
}

/// Compare a ref to a base ref and return the relative position.
///
/// # Arguments
/// * `oid` - The commit of the ref to be compared
/// * `base` - The commit of the base ref
pub fn compare_refs<R: Repository + ?Sized>(repo: &R, oid: Oid, base: Oid) -> Result<RefPosition> {
    let (ahead, behind) = repo.ahead_behind(oid, base)?;
    Ok(RefPosition::from_counts(ahead, behind))
}
