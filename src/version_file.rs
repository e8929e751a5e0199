//! Version files: locate the version string(s) inside a project file and rewrite them.
//!
//! Three kinds of file are supported:
//!
//! - [`VersionFile::Plain`]: the whole file is the version (e.g. a `VERSION` file)
//! - [`VersionFile::Formatted`]: the file is a rendered `%(version)s` template
//! - [`VersionFile::Edited`]: the version is embedded in arbitrary content and located
//!   with a user supplied regular expression, look-around included
//!
//! All kinds share the same consistency rules through [`VersionFile::version`].

use std::fs;
use std::path::{Path, PathBuf};

use fancy_regex::Regex as EditPattern;
use regex::Regex;
use tracing::debug;

use crate::error::{ReleaseError, Result};
use crate::template::Template;

/// A file holding one or more occurrences of the project version
#[derive(Debug, Clone)]
pub enum VersionFile {
    Plain {
        path: PathBuf,
    },
    Formatted {
        path: PathBuf,
        template: Template,
        regex: Regex,
    },
    Edited {
        path: PathBuf,
        pattern: EditPattern,
    },
}

impl VersionFile {
    /// A file whose whole content is the version.
    pub fn plain(path: impl Into<PathBuf>) -> Self {
        VersionFile::Plain { path: path.into() }
    }

    /// A file rendered from a `%(version)s` template.
    pub fn formatted(path: impl Into<PathBuf>, format: &str) -> Result<Self> {
        let template = Template::parse(format)?;
        let regex = template.to_regex()?;
        Ok(VersionFile::Formatted {
            path: path.into(),
            template,
            regex,
        })
    }

    /// A file edited in place wherever `pattern` matches.
    ///
    /// The pattern may have at most one capture group. With a group, only the
    /// captured text is the version; without one, the whole match is.
    pub fn edited(path: impl Into<PathBuf>, pattern: &str) -> Result<Self> {
        let pattern = EditPattern::new(pattern)
            .map_err(|e| ReleaseError::config(format!("Invalid pattern '{}': {}", pattern, e)))?;

        if pattern.captures_len() > 2 {
            return Err(ReleaseError::config(format!(
                "Invalid pattern '{}': at most one capture group is allowed",
                pattern.as_str()
            )));
        }

        Ok(VersionFile::Edited {
            path: path.into(),
            pattern,
        })
    }

    pub fn path(&self) -> &Path {
        match self {
            VersionFile::Plain { path }
            | VersionFile::Formatted { path, .. }
            | VersionFile::Edited { path, .. } => path,
        }
    }

    /// All the raw version occurrences found in the file, in order.
    pub fn versions(&self) -> Result<Vec<String>> {
        let data = fs::read_to_string(self.path())?;

        let versions = match self {
            VersionFile::Plain { .. } => vec![strip_line_ending(&data).to_string()],
            VersionFile::Formatted { regex, .. } => match regex.captures(&data) {
                Some(caps) => caps
                    .iter()
                    .skip(1)
                    .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
                    .collect(),
                None => Vec::new(),
            },
            VersionFile::Edited { pattern, .. } => version_spans(pattern, &data)?
                .into_iter()
                .map(|(start, end)| data[start..end].to_string())
                .collect(),
        };

        debug!(path = %self.path().display(), ?versions, "Read version occurrences");
        Ok(versions)
    }

    /// The single consistent version of the file.
    ///
    /// # Errors
    /// * [`ReleaseError::VersionNotFound`] - no occurrence at all
    /// * [`ReleaseError::VersionInconsistent`] - occurrences disagree
    /// * [`ReleaseError::VersionEmpty`] - occurrences agree on the empty string
    pub fn version(&self) -> Result<String> {
        let versions = self.versions()?;

        let first = match versions.first() {
            Some(first) => first.clone(),
            None => {
                return Err(ReleaseError::VersionNotFound {
                    path: self.path().to_path_buf(),
                })
            }
        };

        if versions.iter().any(|version| *version != first) {
            return Err(ReleaseError::VersionInconsistent {
                path: self.path().to_path_buf(),
                versions,
            });
        }

        if first.is_empty() {
            return Err(ReleaseError::VersionEmpty {
                path: self.path().to_path_buf(),
            });
        }

        Ok(first)
    }

    /// Rewrite the file so that every occurrence holds `version`.
    pub fn set_version(&self, version: &str) -> Result<()> {
        let content = match self {
            VersionFile::Plain { path } => {
                let ending = match fs::read_to_string(path) {
                    Ok(data) => line_ending(&data),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => "",
                    Err(e) => return Err(e.into()),
                };
                format!("{}{}", version, ending)
            }
            VersionFile::Formatted { template, .. } => template.render(version),
            VersionFile::Edited { path, pattern } => {
                let data = fs::read_to_string(path)?;
                replace_occurrences(pattern, &data, version)?
            }
        };

        debug!(path = %self.path().display(), version, "Writing version file");
        fs::write(self.path(), content)?;
        Ok(())
    }
}

fn strip_line_ending(data: &str) -> &str {
    data.strip_suffix("\r\n")
        .or_else(|| data.strip_suffix('\n'))
        .unwrap_or(data)
}

/// The trailing line ending of `data`, kept when the file is rewritten.
fn line_ending(data: &str) -> &'static str {
    if data.ends_with("\r\n") {
        "\r\n"
    } else if data.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

/// Byte spans of the version in every match: the capture group, or the whole match.
fn version_spans(pattern: &EditPattern, data: &str) -> Result<Vec<(usize, usize)>> {
    let group = usize::from(pattern.captures_len() > 1);
    let mut spans = Vec::new();

    for caps in pattern.captures_iter(data) {
        let caps = caps.map_err(|e| {
            ReleaseError::config(format!("Cannot match pattern '{}': {}", pattern.as_str(), e))
        })?;
        if let Some(target) = caps.get(group) {
            spans.push((target.start(), target.end()));
        }
    }

    Ok(spans)
}

/// Splice `version` over the capture group (or the whole match) of every match.
fn replace_occurrences(pattern: &EditPattern, data: &str, version: &str) -> Result<String> {
    let mut output = String::with_capacity(data.len());
    let mut last = 0;

    for (start, end) in version_spans(pattern, data)? {
        output.push_str(&data[last..start]);
        output.push_str(version);
        last = end;
    }

    output.push_str(&data[last..]);
    Ok(output)
}
