//! Version string conventions.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::Deserialize;

/// Canonical PEP 440 public version: `[N!]N(.N)*[{a|b|rc}N][.postN][.devN]`
const PEP440_CANONICAL: &str = r"^([1-9][0-9]*!)?(0|[1-9][0-9]*)(\.(0|[1-9][0-9]*))*((a|b|rc)(0|[1-9][0-9]*))?(\.post(0|[1-9][0-9]*))?(\.dev(0|[1-9][0-9]*))?$";

/// The convention a new version string must follow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum VersionConvention {
    /// Any version string is accepted
    #[default]
    AcceptAll,
    /// [Semantic Versioning](https://semver.org)
    Semver,
    /// [PEP 440](https://peps.python.org/pep-0440/), canonical form only
    Pep440,
}

impl VersionConvention {
    /// Validate a version string, returning the reason when it is rejected.
    pub fn validate(&self, version: &str) -> Result<(), String> {
        match self {
            VersionConvention::AcceptAll => Ok(()),
            VersionConvention::Semver => semver::Version::parse(version)
                .map(|_| ())
                .map_err(|_| format!("Invalid semver version string: '{}'", version)),
            VersionConvention::Pep440 => {
                if is_canonical_pep440(version) {
                    Ok(())
                } else {
                    Err(format!("Invalid pep440 version string: '{}'", version))
                }
            }
        }
    }
}

fn is_canonical_pep440(version: &str) -> bool {
    // the pattern is a constant, a failure here is a programming error
    Regex::new(PEP440_CANONICAL)
        .map(|regex| regex.is_match(version))
        .unwrap_or(false)
}

impl FromStr for VersionConvention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "semver" => Ok(VersionConvention::Semver),
            "pep440" => Ok(VersionConvention::Pep440),
            _ => Err(format!(
                "Invalid version convention '{}': expected 'semver' or 'pep440'",
                s
            )),
        }
    }
}

impl TryFrom<String> for VersionConvention {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for VersionConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionConvention::AcceptAll => write!(f, "any"),
            VersionConvention::Semver => write!(f, "semver"),
            VersionConvention::Pep440 => write!(f, "pep440"),
        }
    }
}
