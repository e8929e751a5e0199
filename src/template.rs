//! `%(version)s` templates.
//!
//! Version files, commit messages and tag names share one tiny template syntax:
//! `%(version)s` is replaced by the version string and `%%` renders a single `%`.

use std::fmt;

use regex::Regex;

use crate::error::{ReleaseError, Result};

const PLACEHOLDER: &str = "%(version)s";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Version,
}

/// A parsed version template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template, rejecting any `%` directive other than `%(version)s` and `%%`.
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(index) = rest.find('%') {
            literal.push_str(&rest[..index]);
            let tail = &rest[index..];

            if let Some(after) = tail.strip_prefix(PLACEHOLDER) {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Version);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("%%") {
                literal.push('%');
                rest = after;
            } else {
                return Err(ReleaseError::config(format!(
                    "Invalid format '{}': only {} and %% are supported",
                    source, PLACEHOLDER
                )));
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Template {
            source: source.to_string(),
            segments,
        })
    }

    /// The template as written in the configuration
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of `%(version)s` placeholders
    pub fn placeholder_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, Segment::Version))
            .count()
    }

    /// Substitute `version` for every placeholder.
    pub fn render(&self, version: &str) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.as_str(),
                Segment::Version => version,
            })
            .collect()
    }

    /// Build a regex matching a rendered template, one capture group per placeholder.
    pub fn to_regex(&self) -> Result<Regex> {
        let pattern: String = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => regex::escape(text),
                Segment::Version => "(.*)".to_string(),
            })
            .collect();

        Regex::new(&pattern).map_err(|e| {
            ReleaseError::config(format!("Invalid format '{}': {}", self.source, e))
        })
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}
