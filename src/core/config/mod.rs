//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! repokit has two configuration scopes:
//! - **Global**: User-level settings
//! - **Repo**: Per-repository overrides, stored inside the git directory so
//!   bare repositories can carry them too
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$REPOKIT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/repokit/config.toml`
//! 3. `~/.repokit/config.toml` (canonical write location)
//!
//! # Repo Config Location
//!
//! `<git_dir>/repokit/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use repokit::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Some(Path::new("/srv/repos/gitlabhq.git"))).unwrap();
//! println!("archives go to {}", config.storage_path().display());
//! println!("preferred branch: {}", config.preferred_branch());
//! ```

pub mod schema;

pub use schema::{ArchiveDefaults, GlobalConfig, RepoConfig, SearchDefaults};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::core::format::ArchiveFormat;

/// Branch preferred by default-branch discovery when nothing is configured.
pub const DEFAULT_PREFERRED_BRANCH: &str = "master";

/// Context lines around search matches when nothing is configured.
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("unknown config key: {0}")]
    UnknownKey(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Keys addressable from the command line, with the scope that stores them.
pub const KEYS: &[(&str, Scope)] = &[
    ("archive.storage_path", Scope::Global),
    ("archive.format", Scope::Global),
    ("search.context_lines", Scope::Global),
    ("default_branch", Scope::Repo),
];

/// Which config file a key lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Repo,
}

/// Merged configuration from all sources.
///
/// Accessor methods apply precedence rules. Repo config overrides global
/// config, which overrides built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if one was found)
    pub repo: Option<RepoConfig>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the repo config file (if loaded)
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// If `git_dir` is provided, the repo config inside it is loaded too.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated. Missing files are not an error.
    pub fn load(git_dir: Option<&Path>) -> Result<Config, ConfigError> {
        Self::load_from(Self::find_global().as_deref(), git_dir)
    }

    /// Load from an explicit global config path instead of searching for one.
    pub fn load_from(global: Option<&Path>, git_dir: Option<&Path>) -> Result<Config, ConfigError> {
        let (global, global_path) = match global.filter(|p| p.exists()) {
            Some(path) => (Self::read_toml::<GlobalConfig>(path)?, Some(path.to_path_buf())),
            None => (GlobalConfig::default(), None),
        };

        let (repo, repo_path) = match git_dir.map(Self::repo_config_path) {
            Some(path) if path.exists() => (Some(Self::read_toml::<RepoConfig>(&path)?), Some(path)),
            _ => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        debug!(
            global = ?global_path,
            repo = ?repo_path,
            "loaded configuration"
        );

        Ok(Config {
            global,
            repo,
            global_path,
            repo_path,
        })
    }

    /// Locate the global config file, if any exists.
    fn find_global() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("REPOKIT_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("repokit/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".repokit/config.toml"))
            .filter(|path| path.exists())
    }

    fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Canonical path for global config: `~/.repokit/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".repokit/config.toml"))
    }

    /// Canonical path for repo config inside `git_dir`.
    pub fn repo_config_path(git_dir: &Path) -> PathBuf {
        git_dir.join("repokit").join("config.toml")
    }

    /// Write global config atomically to `path`.
    pub fn write_global(path: &Path, config: &GlobalConfig) -> Result<(), ConfigError> {
        config.validate()?;
        Self::write_config_atomic(path, config)
    }

    /// Write repo config atomically into `git_dir`.
    pub fn write_repo(git_dir: &Path, config: &RepoConfig) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = Self::repo_config_path(git_dir);
        Self::write_config_atomic(&path, config)?;
        Ok(path)
    }

    /// Write to a temp file in the target directory, then rename over the target.
    fn write_config_atomic<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
        let write_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| ConfigError::WriteError { path, source }
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err(path))?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension(format!("toml.{}.tmp", uuid::Uuid::new_v4()));
        let result = fs::File::create(&temp_path)
            .and_then(|mut file| {
                file.write_all(contents.as_bytes())?;
                file.sync_all()
            })
            .map_err(write_err(&temp_path))
            .and_then(|()| fs::rename(&temp_path, path).map_err(write_err(path)));

        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    fn repo_archive(&self) -> Option<&ArchiveDefaults> {
        self.repo.as_ref().and_then(|r| r.archive.as_ref())
    }

    /// Directory archives are written under.
    ///
    /// Defaults to the system temp directory.
    pub fn storage_path(&self) -> PathBuf {
        self.repo_archive()
            .and_then(|a| a.storage_path.clone())
            .or_else(|| {
                self.global
                    .archive
                    .as_ref()
                    .and_then(|a| a.storage_path.clone())
            })
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Archive format used when the caller names none. Defaults to `tar.gz`.
    pub fn archive_format(&self) -> ArchiveFormat {
        self.repo_archive()
            .and_then(|a| a.format.as_deref())
            .or_else(|| {
                self.global
                    .archive
                    .as_ref()
                    .and_then(|a| a.format.as_deref())
            })
            .map(ArchiveFormat::from_name_or_default)
            .unwrap_or_default()
    }

    /// Lines of context around search matches. Defaults to 3.
    pub fn context_lines(&self) -> usize {
        self.global
            .search
            .as_ref()
            .and_then(|s| s.context_lines)
            .unwrap_or(DEFAULT_CONTEXT_LINES)
    }

    /// Branch preferred by default-branch discovery. Defaults to `master`.
    pub fn preferred_branch(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.default_branch.as_deref())
            .unwrap_or(DEFAULT_PREFERRED_BRANCH)
    }

    /// Effective value of a CLI-addressable key.
    pub fn get(&self, key: &str) -> Result<String, ConfigError> {
        match key {
            "archive.storage_path" => Ok(self.storage_path().display().to_string()),
            "archive.format" => Ok(self.archive_format().to_string()),
            "search.context_lines" => Ok(self.context_lines().to_string()),
            "default_branch" => Ok(self.preferred_branch().to_string()),
            _ => Err(ConfigError::UnknownKey(key.to_string())),
        }
    }

    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}

/// Scope a CLI-addressable key is stored in.
pub fn scope_of(key: &str) -> Result<Scope, ConfigError> {
    KEYS.iter()
        .find(|(k, _)| *k == key)
        .map(|(_, scope)| *scope)
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
}

impl GlobalConfig {
    /// Set a global key from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "archive.storage_path" => {
                self.archive.get_or_insert_with(Default::default).storage_path =
                    Some(PathBuf::from(value));
            }
            "archive.format" => {
                self.archive.get_or_insert_with(Default::default).format = Some(value.to_string());
            }
            "search.context_lines" => {
                let lines = value.parse().map_err(|_| {
                    ConfigError::InvalidValue(format!("context_lines must be a number, got '{value}'"))
                })?;
                self.search.get_or_insert_with(Default::default).context_lines = Some(lines);
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        self.validate()
    }
}

impl RepoConfig {
    /// Set a repo key from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "default_branch" => self.default_branch = Some(value.to_string()),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        self.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn defaults_without_files() {
        let config = Config::load_from(None, None).unwrap();

        assert_eq!(config.storage_path(), std::env::temp_dir());
        assert_eq!(config.archive_format(), ArchiveFormat::TarGz);
        assert_eq!(config.context_lines(), 3);
        assert_eq!(config.preferred_branch(), "master");
        assert!(config.global_config_loaded_from().is_none());
        assert!(config.repo_config_loaded_from().is_none());
    }

    #[test]
    fn global_file_applies() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("config.toml");
        write(
            &global,
            r#"
            [archive]
            storage_path = "/var/cache/repokit"
            format = "zip"

            [search]
            context_lines = 1
            "#,
        );

        let config = Config::load_from(Some(&global), None).unwrap();

        assert_eq!(config.storage_path(), PathBuf::from("/var/cache/repokit"));
        assert_eq!(config.archive_format(), ArchiveFormat::Zip);
        assert_eq!(config.context_lines(), 1);
        assert_eq!(config.global_config_loaded_from(), Some(global.as_path()));
    }

    #[test]
    fn repo_overrides_global() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("config.toml");
        write(&global, "[archive]\nformat = \"zip\"\n");

        let git_dir = temp.path().join("project.git");
        write(
            &Config::repo_config_path(&git_dir),
            "default_branch = \"main\"\n[archive]\nformat = \"tbz2\"\n",
        );

        let config = Config::load_from(Some(&global), Some(&git_dir)).unwrap();

        assert_eq!(config.archive_format(), ArchiveFormat::TarBz2);
        assert_eq!(config.preferred_branch(), "main");
    }

    #[test]
    fn missing_global_path_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(Some(&temp.path().join("absent.toml")), None).unwrap();
        assert!(config.global_config_loaded_from().is_none());
    }

    #[test]
    fn parse_error_names_file() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("config.toml");
        write(&global, "archive = [not toml");

        let err = Config::load_from(Some(&global), None).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn invalid_repo_value_rejected() {
        let temp = TempDir::new().unwrap();
        write(
            &Config::repo_config_path(temp.path()),
            "default_branch = \"invalid..name\"",
        );
        assert!(Config::load_from(None, Some(temp.path())).is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        write(
            &Config::repo_config_path(temp.path()),
            "default_branch = \"main\"\nunknown_field = true\n",
        );
        assert!(Config::load_from(None, Some(temp.path())).is_err());
    }

    #[test]
    fn write_repo_then_load() {
        let temp = TempDir::new().unwrap();
        let config = RepoConfig {
            default_branch: Some("develop".to_string()),
            ..Default::default()
        };

        let path = Config::write_repo(temp.path(), &config).unwrap();
        assert!(path.exists());

        let loaded = Config::load_from(None, Some(temp.path())).unwrap();
        assert_eq!(loaded.preferred_branch(), "develop");
        assert_eq!(loaded.repo_config_loaded_from(), Some(path.as_path()));

        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn failed_write_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        // A directory where the config file should go makes the rename fail.
        let path = Config::repo_config_path(temp.path());
        fs::create_dir_all(path.join("occupied")).unwrap();

        let config = RepoConfig {
            default_branch: Some("develop".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            Config::write_repo(temp.path(), &config),
            Err(ConfigError::WriteError { .. })
        ));

        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn write_rejects_invalid_config() {
        let temp = TempDir::new().unwrap();
        let config = RepoConfig {
            default_branch: Some("has space".to_string()),
            ..Default::default()
        };
        assert!(Config::write_repo(temp.path(), &config).is_err());
        assert!(!Config::repo_config_path(temp.path()).exists());
    }

    mod keys {
        use super::*;

        #[test]
        fn scopes() {
            assert_eq!(scope_of("default_branch").unwrap(), Scope::Repo);
            assert_eq!(scope_of("archive.format").unwrap(), Scope::Global);
            assert!(matches!(
                scope_of("trunk"),
                Err(ConfigError::UnknownKey(k)) if k == "trunk"
            ));
        }

        #[test]
        fn global_set_and_get() {
            let mut global = GlobalConfig::default();
            global.set("archive.format", "zip").unwrap();
            global.set("search.context_lines", "7").unwrap();

            let config = Config {
                global,
                ..Default::default()
            };
            assert_eq!(config.get("archive.format").unwrap(), "zip");
            assert_eq!(config.get("search.context_lines").unwrap(), "7");
        }

        #[test]
        fn global_set_validates() {
            let mut global = GlobalConfig::default();
            assert!(global.set("archive.format", "rar").is_err());
            assert!(global.set("search.context_lines", "many").is_err());
        }

        #[test]
        fn repo_set_and_get() {
            let mut repo = RepoConfig::default();
            repo.set("default_branch", "stable").unwrap();
            assert!(repo.set("archive.format", "zip").is_err());

            let config = Config {
                repo: Some(repo),
                ..Default::default()
            };
            assert_eq!(config.get("default_branch").unwrap(), "stable");
        }
    }
}
