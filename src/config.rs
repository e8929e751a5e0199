use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ReleaseError, Result};
use crate::template::Template;
use crate::validation::VersionConvention;
use crate::version_file::VersionFile;

/// Name of the configuration file looked up in the project
pub const CONFIG_FILE: &str = "project-release.toml";

/// A commented sample configuration, printed by `--sample-config`.
pub const SAMPLE_CONFIG: &str = r#"# project-release configuration

[convention]
# Convention the new version must follow: "semver" or "pep440" (default: any)
version = "semver"

[file]
# Files holding the version. A plain path means the whole file is the version.
# `format` renders the whole file from a template, `pattern` edits matches in place.
version = [
    "VERSION",
    { path = "docs/version.txt", format = "Release v%(version)s" },
    { path = "src/pkg/__init__.py", pattern = '__version__ = "(.*)"' },
]

[git.branch]
# Allowed branch names, glob patterns are accepted
development = "main"
release = ["release/*"]

[git.commit]
message = "bump: version %(version)s"
sign-off = false

[git.tag]
format = "v%(version)s"
message = "version %(version)s"
annotate = true
"#;

/// Represents the complete configuration for project-release.
///
/// Contains the version convention, the version files, and the git branch, commit
/// and tag settings.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub convention: ConventionConfig,

    #[serde(default)]
    pub file: FileConfig,

    #[serde(default)]
    pub git: GitConfig,
}

/// Conventions applied to the new version.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ConventionConfig {
    #[serde(default)]
    pub version: VersionConvention,
}

/// Files holding the project version.
///
/// Entries are validated and compiled while the configuration is parsed.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default, deserialize_with = "deserialize_version_files")]
    pub version: Vec<VersionFile>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct GitConfig {
    #[serde(default)]
    pub branch: BranchConfig,

    #[serde(default)]
    pub commit: CommitConfig,

    #[serde(default)]
    pub tag: TagConfig,
}

/// Branch names allowed for development and release, plain or glob patterns.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct BranchConfig {
    #[serde(default, deserialize_with = "deserialize_branch_names")]
    pub development: Vec<String>,

    #[serde(default, deserialize_with = "deserialize_branch_names")]
    pub release: Vec<String>,
}

fn default_commit_message() -> String {
    "bump: version %(version)s".to_string()
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct CommitConfig {
    #[serde(default = "default_commit_message")]
    pub message: String,

    #[serde(default, rename = "sign-off")]
    pub sign_off: bool,

    #[serde(default, rename = "gpg-sign")]
    pub gpg_sign: bool,
}

impl Default for CommitConfig {
    fn default() -> Self {
        CommitConfig {
            message: default_commit_message(),
            sign_off: false,
            gpg_sign: false,
        }
    }
}

fn default_tag_format() -> String {
    "%(version)s".to_string()
}

fn default_tag_message() -> String {
    "version %(version)s".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TagConfig {
    #[serde(default = "default_tag_format")]
    pub format: String,

    #[serde(default = "default_tag_message")]
    pub message: String,

    #[serde(default = "default_true")]
    pub annotate: bool,

    #[serde(default, rename = "gpg-sign")]
    pub gpg_sign: bool,
}

impl Default for TagConfig {
    fn default() -> Self {
        TagConfig {
            format: default_tag_format(),
            message: default_tag_message(),
            annotate: true,
            gpg_sign: false,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::Many(values) => values,
            OneOrMany::One(value) => vec![value],
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VersionFileEntry {
    Path(String),
    Table(VersionFileTable),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct VersionFileTable {
    path: Option<String>,
    format: Option<String>,
    pattern: Option<String>,
}

impl VersionFileEntry {
    fn into_version_file(self) -> Result<VersionFile> {
        let table = match self {
            VersionFileEntry::Path(path) => VersionFileTable {
                path: Some(path),
                format: None,
                pattern: None,
            },
            VersionFileEntry::Table(table) => table,
        };

        let path = match table.path {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => return Err(ReleaseError::config("version file must contain a path")),
        };

        match (table.format, table.pattern) {
            (Some(_), Some(_)) => Err(ReleaseError::config(
                "format and pattern fields are exclusive",
            )),
            (Some(format), None) if format.is_empty() => Err(ReleaseError::config(format!(
                "empty format for version file '{}'",
                path.display()
            ))),
            (None, Some(pattern)) if pattern.is_empty() => Err(ReleaseError::config(format!(
                "empty pattern for version file '{}'",
                path.display()
            ))),
            (Some(format), None) => VersionFile::formatted(path, &format),
            (None, Some(pattern)) => VersionFile::edited(path, &pattern),
            (None, None) => Ok(VersionFile::plain(path)),
        }
    }
}

fn deserialize_version_files<'de, D>(deserializer: D) -> std::result::Result<Vec<VersionFile>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries: Vec<VersionFileEntry> =
        OneOrMany::<VersionFileEntry>::deserialize(deserializer)?.into();
    entries
        .into_iter()
        .map(|entry| entry.into_version_file().map_err(serde::de::Error::custom))
        .collect()
}

fn deserialize_branch_names<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let names: Vec<String> = OneOrMany::<String>::deserialize(deserializer)?.into();
    if names.iter().any(String::is_empty) {
        return Err(serde::de::Error::custom("branch names must not be empty"));
    }
    Ok(names)
}

impl Config {
    /// Check the settings serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        Template::parse(&self.git.commit.message)?;
        Template::parse(&self.git.tag.format)?;
        Template::parse(&self.git.tag.message)?;

        if self.git.tag.format.is_empty() {
            return Err(ReleaseError::config("tag format must not be empty"));
        }

        Ok(())
    }
}

/// Parses and validates configuration text.
pub fn parse_config(text: &str) -> Result<Config> {
    let config: Config = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `project-release.toml` in current directory
/// 3. `project-release.toml` at the repository root
/// 4. `project-release/config.toml` in the user config directory
/// 5. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
/// * `repo_root` - Optional working tree root of the repository
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read, parsed or validated
pub fn load_config(config_path: Option<&Path>, repo_root: Option<&Path>) -> Result<Config> {
    let path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => find_config(repo_root),
    };

    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading configuration");
            let text = fs::read_to_string(&path).map_err(|e| {
                ReleaseError::config(format!("Cannot read '{}': {}", path.display(), e))
            })?;
            parse_config(&text)
        }
        None => {
            tracing::debug!("No configuration file found, using defaults");
            Ok(Config::default())
        }
    }
}

fn find_config(repo_root: Option<&Path>) -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    if let Some(root) = repo_root {
        let in_root = root.join(CONFIG_FILE);
        if in_root.exists() {
            return Some(in_root);
        }
    }

    dirs::config_dir()
        .map(|dir| dir.join("project-release").join("config.toml"))
        .filter(|path| path.exists())
}
