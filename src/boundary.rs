use std::fmt;

/// Warnings that occur while preparing a release.
/// These are non-fatal issues that should be reported to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// Tracked files have uncommitted changes
    DirtyWorkingTree,
    /// The configuration lists no version file
    NoVersionFiles,
    /// The new version is the one already in the version files
    UnchangedVersion { version: String },
    /// GPG signing was requested but is not supported
    SigningUnsupported { object: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::DirtyWorkingTree => {
                write!(f, "The working tree has uncommitted changes")
            }
            BoundaryWarning::NoVersionFiles => {
                write!(f, "No version file configured, only the tag will carry the version")
            }
            BoundaryWarning::UnchangedVersion { version } => {
                write!(f, "The version files already hold version '{}'", version)
            }
            BoundaryWarning::SigningUnsupported { object } => {
                write!(f, "GPG signing is not supported, the {} will not be signed", object)
            }
        }
    }
}
