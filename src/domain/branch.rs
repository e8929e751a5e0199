use glob::{MatchOptions, Pattern};

use crate::error::{ReleaseError, Result};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Branch names allowed by the configuration, split into plain names and glob patterns
#[derive(Debug, Clone, Default)]
pub struct BranchPatterns {
    plain: Vec<String>,
    patterns: Vec<Pattern>,
}

impl BranchPatterns {
    /// Split configured branch names into plain names and glob patterns.
    ///
    /// A name is a pattern when it contains `*`, `?` or `[`.
    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut plain = Vec::new();
        let mut patterns = Vec::new();

        for name in names {
            let name = name.as_ref();
            if is_pattern(name) {
                let pattern = Pattern::new(name).map_err(|e| {
                    ReleaseError::config(format!("Invalid branch pattern '{}': {}", name, e))
                })?;
                patterns.push(pattern);
            } else if !plain.iter().any(|p| p == name) {
                plain.push(name.to_string());
            }
        }

        Ok(BranchPatterns { plain, patterns })
    }

    pub fn plain(&self) -> &[String] {
        &self.plain
    }

    pub fn has_patterns(&self) -> bool {
        !self.patterns.is_empty()
    }

    /// An empty configuration does not constrain the branch name.
    ///
    /// This intentionally widens validation: with nothing configured, any non-empty
    /// name is accepted instead of none.
    pub fn is_unconstrained(&self) -> bool {
        self.plain.is_empty() && self.patterns.is_empty()
    }

    /// Check a branch name against the plain names, then the patterns.
    pub fn validate(&self, name: &str) -> std::result::Result<(), String> {
        if self.is_unconstrained() && !name.is_empty() {
            return Ok(());
        }
        if self.plain.iter().any(|plain| plain == name) {
            return Ok(());
        }
        if self
            .patterns
            .iter()
            .any(|pattern| pattern.matches_with(name, MATCH_OPTIONS))
        {
            return Ok(());
        }
        Err(ReleaseError::InvalidBranch(name.to_string()).to_string())
    }

    pub fn matches(&self, name: &str) -> bool {
        self.validate(name).is_ok()
    }

    /// The only possible branch, when the configuration names exactly one plain branch.
    pub fn single(&self) -> Option<&str> {
        match (self.plain.as_slice(), self.has_patterns()) {
            ([only], false) => Some(only.as_str()),
            _ => None,
        }
    }

    /// Candidates offered for selection: configured plain names plus matching repository branches.
    pub fn candidates(&self, repo_branches: &[String]) -> Vec<String> {
        let mut candidates = self.plain.clone();
        for branch in repo_branches {
            if self.matches(branch) && !candidates.contains(branch) {
                candidates.push(branch.clone());
            }
        }
        candidates.sort();
        candidates
    }
}

fn is_pattern(name: &str) -> bool {
    name.contains(['*', '?', '['])
}
