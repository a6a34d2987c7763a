//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$REPOKIT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/repokit/config.toml`
//! 3. `~/.repokit/config.toml` (canonical write location)
//!
//! # Repo Config
//!
//! Located at `<git_dir>/repokit/config.toml`.
//!
//! # Validation
//!
//! Values are validated after parsing: format names must be known, the
//! preferred default branch must be a valid branch name.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::format::ArchiveFormat;
use crate::core::types::BranchName;

/// Upper bound on search context, to keep snippets readable.
pub const MAX_CONTEXT_LINES: usize = 100;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// [archive]
/// storage_path = "/var/cache/repokit"
/// format = "tar.gz"
///
/// [search]
/// context_lines = 3
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Archive export defaults
    pub archive: Option<ArchiveDefaults>,

    /// Blob search defaults
    pub search: Option<SearchDefaults>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(archive) = &self.archive {
            archive.validate()?;
        }
        if let Some(search) = &self.search {
            search.validate()?;
        }
        Ok(())
    }
}

/// Repository configuration.
///
/// # Example
///
/// ```toml
/// default_branch = "main"
///
/// [archive]
/// format = "zip"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Branch preferred by default-branch discovery (instead of `master`)
    pub default_branch: Option<String>,

    /// Archive overrides for this repository
    pub archive: Option<ArchiveDefaults>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(branch) = &self.default_branch {
            BranchName::new(branch).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid default_branch: {}", e))
            })?;
        }
        if let Some(archive) = &self.archive {
            archive.validate()?;
        }
        Ok(())
    }
}

/// Archive export defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveDefaults {
    /// Directory archives are written under
    pub storage_path: Option<PathBuf>,

    /// Default format name (`tar.gz`, `zip`, ...)
    pub format: Option<String>,
}

impl ArchiveDefaults {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(format) = &self.format {
            if ArchiveFormat::parse(format).is_none() {
                let known: Vec<_> = ArchiveFormat::ALL.iter().map(|f| f.name()).collect();
                return Err(ConfigError::InvalidValue(format!(
                    "invalid archive format '{}', must be one of: {}",
                    format,
                    known.join(", ")
                )));
            }
        }
        if let Some(path) = &self.storage_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "archive storage_path cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Blob search defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SearchDefaults {
    /// Lines of context shown around each match
    pub context_lines: Option<usize>,
}

impl SearchDefaults {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.context_lines {
            Some(n) if n > MAX_CONTEXT_LINES => Err(ConfigError::InvalidValue(format!(
                "search context_lines must be at most {}, got {}",
                MAX_CONTEXT_LINES, n
            ))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod global_config {
        use super::*;

        #[test]
        fn defaults_are_empty() {
            let config = GlobalConfig::default();
            assert!(config.archive.is_none());
            assert!(config.search.is_none());
            assert!(config.validate().is_ok());
        }

        #[test]
        fn known_format_accepted() {
            let config = GlobalConfig {
                archive: Some(ArchiveDefaults {
                    format: Some("tbz2".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            };
            assert!(config.validate().is_ok());
        }

        #[test]
        fn unknown_format_rejected() {
            let config = GlobalConfig {
                archive: Some(ArchiveDefaults {
                    format: Some("rar".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("rar"));
        }

        #[test]
        fn context_lines_bounded() {
            let config = GlobalConfig {
                search: Some(SearchDefaults {
                    context_lines: Some(MAX_CONTEXT_LINES + 1),
                }),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn roundtrip() {
            let config = GlobalConfig {
                archive: Some(ArchiveDefaults {
                    storage_path: Some(PathBuf::from("/var/cache/repokit")),
                    format: Some("zip".to_string()),
                }),
                search: Some(SearchDefaults {
                    context_lines: Some(5),
                }),
            };

            let toml = toml::to_string_pretty(&config).unwrap();
            let parsed: GlobalConfig = toml::from_str(&toml).unwrap();
            assert_eq!(config, parsed);
        }
    }

    mod repo_config {
        use super::*;

        #[test]
        fn valid_default_branch() {
            let config = RepoConfig {
                default_branch: Some("main".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_ok());
        }

        #[test]
        fn invalid_default_branch() {
            let config = RepoConfig {
                default_branch: Some("invalid..name".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn empty_storage_path_rejected() {
            let config = RepoConfig {
                archive: Some(ArchiveDefaults {
                    storage_path: Some(PathBuf::new()),
                    ..Default::default()
                }),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn reject_unknown_fields() {
            let toml = r#"
                default_branch = "main"
                trunk = "main"
            "#;

            let result: Result<RepoConfig, _> = toml::from_str(toml);
            assert!(result.is_err());
        }
    }
}
