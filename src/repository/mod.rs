//! repository
//!
//! The repository wrapper.
//!
//! # Overview
//!
//! [`Repository`] opens a bare or non-bare repository and answers the
//! questions callers actually ask: which branches and tags exist, which one
//! is the default, what the history looks like, how big the repository is.
//! Archive export, blob search and submodule listing live in their own
//! submodules but extend the same type.
//!
//! All git access goes through [`crate::git::Git`]. Operations that take an
//! optional ref fall back to the default branch ([`Repository::root_ref`]).
//!
//! # Example
//!
//! ```no_run
//! use repokit::repository::Repository;
//!
//! let repo = Repository::new("/srv/repos/gitlabhq.git")?;
//! println!("{} has {} branches", repo.name(), repo.branch_names()?.len());
//! if let Some(default) = repo.root_ref()? {
//!     println!("default branch: {default}");
//! }
//! # Ok::<(), repokit::repository::RepositoryError>(())
//! ```

mod archive;
pub mod default_branch;
mod search;
mod submodules;

pub use search::BlobSnippet;
pub use submodules::{parse_gitmodules, GitmodulesEntry, Submodule};

pub use crate::git::{CommitInfo, DiffEntry, DiffStatus};

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::core::config::{Config, ConfigError};
use crate::core::lock::LockError;
use crate::core::types::Oid;
use crate::git::{Git, GitError, WalkOptions};

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Git(#[from] GitError),

    /// An operation needed the default branch, and the repository has none.
    #[error("repository has no default branch")]
    NoDefaultBranch,

    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl RepositoryError {
    /// True when there was no repository to open at all.
    pub fn is_not_a_repo(&self) -> bool {
        matches!(self, RepositoryError::Git(GitError::NotARepo { .. }))
    }

    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| RepositoryError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A local branch and the commit at its tip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub name: String,
    pub commit: CommitInfo,
}

/// A tag and the commit it peels to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub name: String,
    pub target: Oid,
    /// Annotation message; `None` for lightweight tags
    pub message: Option<String>,
}

/// Options for [`Repository::log`].
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Start point; the default branch when `None`
    pub ref_name: Option<String>,
    /// Only commits that change this path
    pub path: Option<String>,
    /// Maximum number of commits
    pub limit: Option<usize>,
    /// Commits to skip before the first one returned
    pub offset: usize,
}

/// A git repository on disk.
#[derive(Debug)]
pub struct Repository {
    path: PathBuf,
    name: String,
    git: Git,
    config: Config,
}

impl Repository {
    /// Open the repository at exactly `path`, loading its configuration.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if there is no repository at `path`
    /// - [`RepositoryError::Config`] if a config file is malformed
    pub fn new(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let git = Git::open(path.as_ref())?;
        let config = Config::load(Some(git.git_dir()))?;
        Ok(Self::from_parts(path.as_ref(), git, config))
    }

    /// Open the repository containing `path`, searching parent directories.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let git = Git::discover(path.as_ref())?;
        let info = git.info();
        let root = info.work_dir.unwrap_or(info.git_dir);
        let config = Config::load(Some(git.git_dir()))?;
        Ok(Self::from_parts(&root, git, config))
    }

    /// Open the repository at `path` with an already loaded configuration.
    pub fn with_config(path: impl AsRef<Path>, config: Config) -> Result<Self, RepositoryError> {
        let git = Git::open(path.as_ref())?;
        Ok(Self::from_parts(path.as_ref(), git, config))
    }

    fn from_parts(path: &Path, git: Git, config: Config) -> Self {
        let path = path.to_path_buf();
        let name = std::fs::canonicalize(&path)
            .ok()
            .as_deref()
            .unwrap_or(path.as_path())
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!(path = %path.display(), %name, "repository ready");
        Self {
            path,
            name,
            git,
            config,
        }
    }

    /// Path the repository was opened at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, e.g. `gitlabhq.git`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying git handle.
    pub fn raw(&self) -> &Git {
        &self.git
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Refs
    // =========================================================================

    /// Local branch names, sorted.
    pub fn branch_names(&self) -> Result<Vec<String>, RepositoryError> {
        let mut names: Vec<String> = self
            .git
            .list_branches()?
            .into_iter()
            .map(|(name, _)| name.to_string())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Local branches with their tip commits, sorted by name.
    pub fn branches(&self) -> Result<Vec<Branch>, RepositoryError> {
        let mut branches = self
            .git
            .list_branches()?
            .into_iter()
            .map(|(name, oid)| -> Result<Branch, RepositoryError> {
                Ok(Branch {
                    name: name.to_string(),
                    commit: self.git.commit_info(&oid)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        branches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(branches)
    }

    /// Alias for [`Repository::branches`].
    pub fn heads(&self) -> Result<Vec<Branch>, RepositoryError> {
        self.branches()
    }

    /// Tag names, sorted.
    pub fn tag_names(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self.tags()?.into_iter().map(|t| t.name).collect())
    }

    /// Tags with their targets, sorted by name.
    pub fn tags(&self) -> Result<Vec<Tag>, RepositoryError> {
        let mut tags: Vec<Tag> = self
            .git
            .list_tags()?
            .into_iter()
            .map(|entry| Tag {
                name: entry.name.to_string(),
                target: entry.target,
                message: entry.message,
            })
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    /// Branch names followed by tag names.
    pub fn ref_names(&self) -> Result<Vec<String>, RepositoryError> {
        let mut names = self.branch_names()?;
        names.extend(self.tag_names()?);
        Ok(names)
    }

    /// The branch callers should treat as the default.
    ///
    /// See [`default_branch::discover`] for the rule.
    pub fn discover_default_branch(&self) -> Result<Option<String>, RepositoryError> {
        let branches = self.branch_names()?;
        let head = self.git.head_branch()?;
        Ok(default_branch::discover(
            &branches,
            head.as_ref().map(|h| h.as_str()),
            self.config.preferred_branch(),
        ))
    }

    /// Alias for [`Repository::discover_default_branch`].
    pub fn root_ref(&self) -> Result<Option<String>, RepositoryError> {
        self.discover_default_branch()
    }

    /// `ref_name` if given, else the default branch.
    fn ref_or_default(&self, ref_name: Option<&str>) -> Result<String, RepositoryError> {
        match ref_name {
            Some(r) => Ok(r.to_string()),
            None => self.root_ref()?.ok_or(RepositoryError::NoDefaultBranch),
        }
    }

    // =========================================================================
    // State
    // =========================================================================

    pub fn has_commits(&self) -> Result<bool, RepositoryError> {
        Ok(!self.is_empty()?)
    }

    /// True when no ref points at a commit.
    pub fn is_empty(&self) -> Result<bool, RepositoryError> {
        Ok(self.git.is_empty()?)
    }

    /// Size of the git directory in MiB, rounded to two decimals.
    pub fn size(&self) -> Result<f64, RepositoryError> {
        let bytes = self.git.disk_usage()?;
        Ok(round_mib(bytes))
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Commits reachable from the start ref, newest first.
    pub fn log(&self, opts: &LogOptions) -> Result<Vec<CommitInfo>, RepositoryError> {
        let start = self.ref_or_default(opts.ref_name.as_deref())?;
        let tip = self.git.resolve_revision(&start)?;
        let walk = WalkOptions {
            path: opts.path.as_deref(),
            skip: opts.offset,
            limit: opts.limit,
            ..Default::default()
        };
        Ok(self.git.walk_commits(&tip, &walk)?)
    }

    /// Commits reachable from `to` but not from `from`, oldest first.
    pub fn commits_between(&self, from: &str, to: &str) -> Result<Vec<CommitInfo>, RepositoryError> {
        let from = self.git.resolve_revision(from)?;
        let to = self.git.resolve_revision(to)?;
        let walk = WalkOptions {
            hide: Some(&from),
            reverse: true,
            ..Default::default()
        };
        Ok(self.git.walk_commits(&to, &walk)?)
    }

    /// Number of commits reachable from `ref_name` (default branch if `None`).
    pub fn commit_count(&self, ref_name: Option<&str>) -> Result<usize, RepositoryError> {
        let start = self.ref_or_default(ref_name)?;
        let tip = self.git.resolve_revision(&start)?;
        Ok(self.git.commit_count(None, &tip)?)
    }

    pub fn merge_base_commit(&self, a: &str, b: &str) -> Result<Option<Oid>, RepositoryError> {
        let a = self.git.resolve_revision(a)?;
        let b = self.git.resolve_revision(b)?;
        Ok(self.git.merge_base(&a, &b)?)
    }

    /// Look up a commit by any revision, `None` if it does not resolve.
    pub fn find_commit(&self, rev: &str) -> Result<Option<CommitInfo>, RepositoryError> {
        match self.git.try_resolve_revision(rev)? {
            Some(oid) => Ok(Some(self.git.commit_info(&oid)?)),
            None => Ok(None),
        }
    }

    /// Files changed from `from` to `to`.
    pub fn diff(&self, from: &str, to: &str) -> Result<Vec<DiffEntry>, RepositoryError> {
        let from = self.git.resolve_revision(from)?;
        let to = self.git.resolve_revision(to)?;
        Ok(self.git.diff_commits(&from, &to)?)
    }
}

fn round_mib(bytes: u64) -> f64 {
    let mib = bytes as f64 / BYTES_PER_MIB;
    (mib * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mib_rounding() {
        assert_eq!(round_mib(0), 0.0);
        assert_eq!(round_mib(1024 * 1024), 1.0);
        assert_eq!(round_mib(24_589_107), 23.45);
        assert_eq!(round_mib(5_000), 0.0);
        assert_eq!(round_mib(6_000), 0.01);
    }

    #[test]
    fn error_display() {
        assert_eq!(
            RepositoryError::NoDefaultBranch.to_string(),
            "repository has no default branch"
        );

        let err = RepositoryError::Io {
            path: PathBuf::from("/tmp/x.git"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "I/O error at '/tmp/x.git': denied");
    }

    #[test]
    fn git_errors_pass_through() {
        let err: RepositoryError = GitError::RefNotFound {
            refname: "nope".into(),
        }
        .into();
        assert_eq!(err.to_string(), "ref not found: nope");
    }

    #[test]
    fn only_missing_repository_counts_as_not_a_repo() {
        let missing: RepositoryError = GitError::NotARepo {
            path: PathBuf::from("/tmp/nowhere"),
        }
        .into();
        assert!(missing.is_not_a_repo());

        let broken = RepositoryError::Config(ConfigError::ParseError {
            path: PathBuf::from("/tmp/x.git/repokit/config.toml"),
            message: "unknown field `bogus`".into(),
        });
        assert!(!broken.is_not_a_repo());
        assert!(!RepositoryError::NoDefaultBranch.is_not_a_repo());
    }

    #[test]
    fn log_options_default_is_unbounded() {
        let opts = LogOptions::default();
        assert!(opts.ref_name.is_none());
        assert!(opts.limit.is_none());
        assert_eq!(opts.offset, 0);
    }
}
