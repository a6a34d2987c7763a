//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to all git operations in
//! repokit. Every read of refs, commits, trees and blobs flows through
//! [`Git`], which returns strong types and normalizes libgit2 errors into
//! [`GitError`] categories.
//!
//! The one operation libgit2 does not offer is archive generation; for that
//! [`Git::write_archive`] runs `git archive` against the same git dir and
//! streams its output.
//!
//! # Example
//!
//! ```ignore
//! use repokit::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("/srv/repos/gitlabhq.git"))?;
//! let oid = git.resolve_revision("master")?;
//! println!("master is at {}", oid.short(7));
//! ```

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::core::types::{BranchName, Oid, RefName, TypeError};

/// File mode git records for submodule entries.
const GITLINK_MODE: i32 = 0o160000;

/// Errors from git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// No repository at the given path.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was opened
        path: PathBuf,
    },

    /// Requested ref or revision does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref or revision that was not found
        refname: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// Blob content is not valid UTF-8.
    #[error("blob is not valid UTF-8: {oid}")]
    InvalidUtf8 {
        /// The OID of the blob
        oid: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// A `git` subprocess exited unsuccessfully.
    #[error("`{command}` failed: {message}")]
    CommandFailed {
        /// The command line that was run
        command: String,
        /// Captured stderr, or the spawn error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with the name or id being looked up.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound | git2::ErrorCode::UnbornBranch => {
                if is_full_hex_id(context) {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                } else {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec | git2::ErrorCode::Ambiguous => GitError::RefNotFound {
                refname: context.to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::RefNotFound {
                refname: err.message().to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidRefName {
                message: err.message().to_string(),
            },
            _ => GitError::Internal {
                message: err.message().to_string(),
            },
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidRefName(msg) => GitError::InvalidRefName { message: msg },
            TypeError::InvalidBranchName(msg) => GitError::InvalidRefName { message: msg },
        }
    }
}

/// A full SHA-1 or SHA-256 object id.
fn is_full_hex_id(s: &str) -> bool {
    (s.len() == 40 || s.len() == 64) && s.chars().all(|c| c.is_ascii_hexdigit())
}

fn oid_to_git2(oid: &Oid) -> Result<git2::Oid, GitError> {
    git2::Oid::from_str(oid.as_str()).map_err(|_| GitError::InvalidOid {
        oid: oid.to_string(),
    })
}

fn oid_from_git2(oid: git2::Oid) -> Result<Oid, GitError> {
    Ok(Oid::new(oid.to_string())?)
}

fn timestamp(time: git2::Time) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp(time.seconds(), 0).unwrap_or(chrono::DateTime::UNIX_EPOCH)
}

/// Information about a git repository.
#[derive(Debug, Clone)]
pub struct RepoInfo {
    /// Path to the git directory (`.git`, or the repository itself when bare)
    pub git_dir: PathBuf,
    /// Path to the working directory, `None` for bare repositories
    pub work_dir: Option<PathBuf>,
    /// Whether the repository is bare
    pub is_bare: bool,
}

/// A ref with its name and target OID.
#[derive(Debug, Clone)]
pub struct RefEntry {
    /// The full ref name
    pub name: RefName,
    /// The commit the ref peels to
    pub oid: Oid,
}

/// A tag with the commit it ultimately points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagEntry {
    /// Short tag name (`v1.2.0`)
    pub name: BranchName,
    /// Peeled commit id
    pub target: Oid,
    /// Annotation message; `None` for lightweight tags
    pub message: Option<String>,
}

/// Information about a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    /// The commit OID
    pub oid: Oid,
    /// Parent OIDs, empty for root commits
    pub parents: Vec<Oid>,
    /// First line of the commit message
    pub summary: String,
    /// Full commit message
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub author_time: chrono::DateTime<chrono::Utc>,
    pub committer_name: String,
    pub committer_email: String,
    pub committer_time: chrono::DateTime<chrono::Utc>,
}

/// A blob reachable from a commit's tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobEntry {
    /// Path relative to the tree root, `/`-separated
    pub path: String,
    pub oid: Oid,
}

/// How a file changed between two commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStatus {
    Added,
    Deleted,
    Modified,
    Renamed,
    Copied,
    TypeChange,
}

impl DiffStatus {
    fn from_delta(delta: git2::Delta) -> Option<Self> {
        match delta {
            git2::Delta::Added => Some(DiffStatus::Added),
            git2::Delta::Deleted => Some(DiffStatus::Deleted),
            git2::Delta::Modified => Some(DiffStatus::Modified),
            git2::Delta::Renamed => Some(DiffStatus::Renamed),
            git2::Delta::Copied => Some(DiffStatus::Copied),
            git2::Delta::Typechange => Some(DiffStatus::TypeChange),
            _ => None,
        }
    }

    /// Single-letter code as printed by `git diff --name-status`.
    pub fn code(&self) -> char {
        match self {
            DiffStatus::Added => 'A',
            DiffStatus::Deleted => 'D',
            DiffStatus::Modified => 'M',
            DiffStatus::Renamed => 'R',
            DiffStatus::Copied => 'C',
            DiffStatus::TypeChange => 'T',
        }
    }
}

/// One changed file between two commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffEntry {
    pub old_path: Option<String>,
    pub new_path: Option<String>,
    pub status: DiffStatus,
    pub additions: usize,
    pub deletions: usize,
}

/// Container formats `git archive` can emit natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Tar,
    Zip,
}

impl ArchiveKind {
    fn as_arg(&self) -> &'static str {
        match self {
            ArchiveKind::Tar => "tar",
            ArchiveKind::Zip => "zip",
        }
    }
}

/// Options for [`Git::walk_commits`].
#[derive(Debug, Clone, Default)]
pub struct WalkOptions<'a> {
    /// Commits reachable from this one are excluded
    pub hide: Option<&'a Oid>,
    /// Only commits whose tree differs from every parent at this path
    pub path: Option<&'a str>,
    /// Matching commits to skip before collecting
    pub skip: usize,
    /// Maximum number of commits to return
    pub limit: Option<usize>,
    /// Oldest first instead of newest first
    pub reverse: bool,
}

/// The git interface.
///
/// This is the **single point of interaction** with libgit2. No other module
/// imports `git2`. All operations are reads, apart from
/// [`Git::write_archive`], which only writes to the caller's sink.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening and Info
    // =========================================================================

    /// Open the repository located exactly at `path`.
    ///
    /// Bare repositories (`project.git`) and working trees are both accepted.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if `path` is not a repository
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        debug!(path = %path.display(), bare = repo.is_bare(), "opened repository");
        Ok(Self { repo })
    }

    /// Find the repository containing `path`, searching parent directories.
    pub fn discover(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        Ok(Self { repo })
    }

    pub fn info(&self) -> RepoInfo {
        RepoInfo {
            git_dir: self.repo.path().to_path_buf(),
            work_dir: self.repo.workdir().map(Path::to_path_buf),
            is_bare: self.repo.is_bare(),
        }
    }

    /// Get direct access to the git directory path.
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    // =========================================================================
    // Ref Resolution
    // =========================================================================

    /// Resolve a branch, tag, full ref name or commit id to a commit.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if nothing by that name exists
    pub fn resolve_revision(&self, rev: &str) -> Result<Oid, GitError> {
        let object = self
            .repo
            .revparse_single(rev)
            .map_err(|e| GitError::from_git2(e, rev))?;
        let commit = object
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, rev))?;
        oid_from_git2(commit.id())
    }

    /// Resolve a revision, returning None if it doesn't exist.
    pub fn try_resolve_revision(&self, rev: &str) -> Result<Option<Oid>, GitError> {
        match self.resolve_revision(rev) {
            Ok(oid) => Ok(Some(oid)),
            Err(GitError::RefNotFound { .. }) | Err(GitError::ObjectNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The branch HEAD refers to, whether or not that branch has commits yet.
    ///
    /// Returns `None` when HEAD is detached or does not name a valid branch.
    pub fn head_branch(&self) -> Result<Option<BranchName>, GitError> {
        let head = match self.repo.find_reference("HEAD") {
            Ok(head) => head,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(GitError::from_git2(e, "HEAD")),
        };

        let branch = head
            .symbolic_target()
            .and_then(|target| target.strip_prefix(RefName::HEADS_PREFIX))
            .and_then(|name| BranchName::new(name).ok());
        Ok(branch)
    }

    /// True when no ref points at a commit (a freshly initialized repository).
    pub fn is_empty(&self) -> Result<bool, GitError> {
        Ok(self.list_refs_by_prefix("refs/")?.is_empty())
    }

    // =========================================================================
    // Ref Enumeration
    // =========================================================================

    /// List all refs under `prefix` that peel to a commit.
    ///
    /// Refs with names that fail [`RefName`] validation are skipped.
    pub fn list_refs_by_prefix(&self, prefix: &str) -> Result<Vec<RefEntry>, GitError> {
        let pattern = format!("{}*", prefix);
        let refs = self
            .repo
            .references_glob(&pattern)
            .map_err(|e| GitError::from_git2(e, prefix))?;

        let mut entries = Vec::new();
        for reference in refs {
            let reference = reference?;

            let Some(name) = reference.name() else {
                continue;
            };
            let Ok(name) = RefName::new(name) else {
                debug!(refname = name, "skipping ref with invalid name");
                continue;
            };
            let Ok(commit) = reference.peel_to_commit() else {
                continue;
            };

            entries.push(RefEntry {
                name,
                oid: oid_from_git2(commit.id())?,
            });
        }

        Ok(entries)
    }

    /// List local branches with the commit each one points at.
    ///
    /// Branches whose names fail [`BranchName`] validation are skipped.
    pub fn list_branches(&self) -> Result<Vec<(BranchName, Oid)>, GitError> {
        let branches = self.repo.branches(Some(git2::BranchType::Local))?;

        let mut result = Vec::new();
        for branch in branches {
            let (branch, _) = branch?;
            let Some(name) = branch.name().ok().flatten() else {
                continue;
            };
            let Ok(name) = BranchName::new(name) else {
                debug!(branch = name, "skipping branch with invalid name");
                continue;
            };
            let Ok(commit) = branch.get().peel_to_commit() else {
                continue;
            };
            result.push((name, oid_from_git2(commit.id())?));
        }

        Ok(result)
    }

    /// List tags with their peeled commit and, for annotated tags, the message.
    pub fn list_tags(&self) -> Result<Vec<TagEntry>, GitError> {
        let refs = self
            .repo
            .references_glob(&format!("{}*", RefName::TAGS_PREFIX))?;

        let mut tags = Vec::new();
        for reference in refs {
            let reference = reference?;
            let Some(name) = reference
                .name()
                .and_then(|n| n.strip_prefix(RefName::TAGS_PREFIX))
            else {
                continue;
            };
            let Ok(name) = BranchName::new(name) else {
                continue;
            };
            let Ok(commit) = reference.peel_to_commit() else {
                // Tags of trees or blobs have no commit to show.
                continue;
            };
            let message = reference
                .peel_to_tag()
                .ok()
                .and_then(|tag| tag.message().map(|m| m.trim_end().to_string()));

            tags.push(TagEntry {
                name,
                target: oid_from_git2(commit.id())?,
                message,
            });
        }

        Ok(tags)
    }

    // =========================================================================
    // Commit Information and History
    // =========================================================================

    /// Get information about a commit.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the commit doesn't exist
    pub fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
        let commit = self.find_commit(oid)?;
        Self::describe(&commit)
    }

    fn find_commit(&self, oid: &Oid) -> Result<git2::Commit<'_>, GitError> {
        self.repo
            .find_commit(oid_to_git2(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))
    }

    fn describe(commit: &git2::Commit<'_>) -> Result<CommitInfo, GitError> {
        let author = commit.author();
        let committer = commit.committer();
        let parents = commit
            .parent_ids()
            .map(oid_from_git2)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CommitInfo {
            oid: oid_from_git2(commit.id())?,
            parents,
            summary: commit.summary().unwrap_or("").to_string(),
            message: commit.message().unwrap_or("").to_string(),
            author_name: author.name().unwrap_or("").to_string(),
            author_email: author.email().unwrap_or("").to_string(),
            author_time: timestamp(author.when()),
            committer_name: committer.name().unwrap_or("").to_string(),
            committer_email: committer.email().unwrap_or("").to_string(),
            committer_time: timestamp(committer.when()),
        })
    }

    /// Walk history from `tip`, newest first unless `opts.reverse` is set.
    pub fn walk_commits(&self, tip: &Oid, opts: &WalkOptions<'_>) -> Result<Vec<CommitInfo>, GitError> {
        let mut revwalk = self.repo.revwalk()?;
        let mut sorting = git2::Sort::TOPOLOGICAL | git2::Sort::TIME;
        if opts.reverse {
            sorting |= git2::Sort::REVERSE;
        }
        revwalk.set_sorting(sorting)?;
        revwalk.push(oid_to_git2(tip)?)?;
        if let Some(hide) = opts.hide {
            revwalk.hide(oid_to_git2(hide)?)?;
        }

        let mut commits = Vec::new();
        let mut skipped = 0;
        for id in revwalk {
            if opts.limit.is_some_and(|limit| commits.len() >= limit) {
                break;
            }
            let commit = self.repo.find_commit(id?)?;
            if let Some(path) = opts.path {
                if !self.touches_path(&commit, path)? {
                    continue;
                }
            }
            if skipped < opts.skip {
                skipped += 1;
                continue;
            }
            commits.push(Self::describe(&commit)?);
        }

        Ok(commits)
    }

    /// Whether `commit` differs from every one of its parents at `path`.
    fn touches_path(&self, commit: &git2::Commit<'_>, path: &str) -> Result<bool, GitError> {
        let entry_at = |c: &git2::Commit<'_>| -> Result<Option<git2::Oid>, GitError> {
            match c.tree()?.get_path(Path::new(path)) {
                Ok(entry) => Ok(Some(entry.id())),
                Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        };

        let own = entry_at(commit)?;
        if commit.parent_count() == 0 {
            return Ok(own.is_some());
        }
        for parent in commit.parents() {
            if entry_at(&parent)? == own {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Count commits reachable from `tip` but not from `base`.
    pub fn commit_count(&self, base: Option<&Oid>, tip: &Oid) -> Result<usize, GitError> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(oid_to_git2(tip)?)?;
        if let Some(base) = base {
            revwalk.hide(oid_to_git2(base)?)?;
        }
        Ok(revwalk.count())
    }

    /// Find the merge base (common ancestor) of two commits.
    ///
    /// Returns `None` if there is no common ancestor.
    pub fn merge_base(&self, a: &Oid, b: &Oid) -> Result<Option<Oid>, GitError> {
        match self.repo.merge_base(oid_to_git2(a)?, oid_to_git2(b)?) {
            Ok(oid) => Ok(Some(oid_from_git2(oid)?)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // =========================================================================
    // Trees and Blobs
    // =========================================================================

    /// Every blob in the tree of `commit`, in tree order.
    ///
    /// Submodule entries are not blobs and are not returned. Content is not
    /// loaded; see [`Git::for_each_blob`].
    pub fn tree_blobs(&self, commit: &Oid) -> Result<Vec<BlobEntry>, GitError> {
        self.blob_ids(commit)?
            .into_iter()
            .map(|(path, id)| -> Result<BlobEntry, GitError> {
                Ok(BlobEntry {
                    path,
                    oid: oid_from_git2(id)?,
                })
            })
            .collect()
    }

    /// Call `visit` with the path and content of every blob in `commit`'s
    /// tree, in tree order.
    ///
    /// Only one blob is held in memory at a time.
    pub fn for_each_blob<F>(&self, commit: &Oid, mut visit: F) -> Result<(), GitError>
    where
        F: FnMut(&str, &[u8]),
    {
        for (path, id) in self.blob_ids(commit)? {
            let blob = self.repo.find_blob(id)?;
            visit(&path, blob.content());
        }
        Ok(())
    }

    fn blob_ids(&self, commit: &Oid) -> Result<Vec<(String, git2::Oid)>, GitError> {
        let tree = self.find_commit(commit)?.tree()?;

        let mut found = Vec::new();
        tree.walk(git2::TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() == Some(git2::ObjectType::Blob) {
                if let Some(name) = entry.name() {
                    found.push((format!("{root}{name}"), entry.id()));
                }
            }
            git2::TreeWalkResult::Ok
        })?;
        Ok(found)
    }

    /// Content of the blob at `path` in `commit`'s tree, or `None` if absent.
    pub fn read_path_at(&self, commit: &Oid, path: &str) -> Result<Option<Vec<u8>>, GitError> {
        let tree = self.find_commit(commit)?.tree()?;
        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if entry.kind() != Some(git2::ObjectType::Blob) {
            return Ok(None);
        }
        let blob = self.repo.find_blob(entry.id())?;
        Ok(Some(blob.content().to_vec()))
    }

    /// Like [`Git::read_path_at`], but decoded as UTF-8.
    pub fn read_path_as_string(&self, commit: &Oid, path: &str) -> Result<Option<String>, GitError> {
        match self.read_path_at(commit, path)? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| GitError::InvalidUtf8 {
                    oid: format!("{}:{}", commit, path),
                }),
            None => Ok(None),
        }
    }

    /// The commit a submodule entry at `path` records, if `path` is a gitlink.
    pub fn gitlink_at(&self, commit: &Oid, path: &str) -> Result<Option<Oid>, GitError> {
        let tree = self.find_commit(commit)?.tree()?;
        match tree.get_path(Path::new(path)) {
            Ok(entry) if entry.filemode() == GITLINK_MODE => Ok(Some(oid_from_git2(entry.id())?)),
            Ok(_) => Ok(None),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // =========================================================================
    // Diff
    // =========================================================================

    /// Files changed between two commits, with line counts.
    ///
    /// Renames are detected.
    pub fn diff_commits(&self, from: &Oid, to: &Oid) -> Result<Vec<DiffEntry>, GitError> {
        let old_tree = self.find_commit(from)?.tree()?;
        let new_tree = self.find_commit(to)?.tree()?;

        let mut diff = self
            .repo
            .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)?;
        diff.find_similar(None)?;

        let mut entries = Vec::new();
        for (idx, delta) in diff.deltas().enumerate() {
            let Some(status) = DiffStatus::from_delta(delta.status()) else {
                continue;
            };
            let (additions, deletions) = match git2::Patch::from_diff(&diff, idx)? {
                Some(patch) => {
                    let (_, additions, deletions) = patch.line_stats()?;
                    (additions, deletions)
                }
                None => (0, 0),
            };
            let path_of = |file: git2::DiffFile<'_>| {
                file.path().map(|p| p.to_string_lossy().into_owned())
            };

            entries.push(DiffEntry {
                old_path: match status {
                    DiffStatus::Added => None,
                    _ => path_of(delta.old_file()),
                },
                new_path: match status {
                    DiffStatus::Deleted => None,
                    _ => path_of(delta.new_file()),
                },
                status,
                additions,
                deletions,
            });
        }

        Ok(entries)
    }

    // =========================================================================
    // Archive and Disk Usage
    // =========================================================================

    /// Run `git archive` for `commit`, copying its output into `out`.
    ///
    /// Every entry in the archive is placed under `prefix` (which should end
    /// in `/`). Returns the number of bytes written. The output is streamed,
    /// never buffered whole.
    ///
    /// # Errors
    ///
    /// - [`GitError::CommandFailed`] if `git` cannot be spawned, exits
    ///   unsuccessfully, or `out` rejects a write
    pub fn write_archive<W: Write + ?Sized>(
        &self,
        commit: &Oid,
        prefix: &str,
        kind: ArchiveKind,
        out: &mut W,
    ) -> Result<u64, GitError> {
        let args = [
            "archive".to_string(),
            format!("--format={}", kind.as_arg()),
            format!("--prefix={prefix}"),
            commit.to_string(),
        ];
        let command_line = format!("git {}", args.join(" "));
        debug!(command = %command_line, git_dir = %self.git_dir().display(), "running git archive");
        let failed = |message: String| GitError::CommandFailed {
            command: command_line.clone(),
            message,
        };

        let mut child = Command::new("git")
            .arg("--git-dir")
            .arg(self.git_dir())
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| failed(e.to_string()))?;

        // Drain stderr on the side so a chatty git cannot stall on a full pipe.
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });

        // Dropping stdout after a failed copy stops git with SIGPIPE.
        let copied = match child.stdout.take() {
            Some(mut stdout) => io::copy(&mut stdout, out),
            None => Ok(0),
        };

        let status = child.wait().map_err(|e| failed(e.to_string()))?;
        let stderr = stderr
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(failed(stderr.trim().to_string()));
        }
        copied.map_err(|e| failed(format!("writing archive: {e}")))
    }

    /// Total size in bytes of every file under the git directory.
    pub fn disk_usage(&self) -> Result<u64, GitError> {
        let mut total = 0;
        for entry in walkdir::WalkDir::new(self.git_dir()) {
            let entry = entry.map_err(|e| GitError::AccessError {
                message: e.to_string(),
            })?;
            if entry.file_type().is_file() {
                let metadata = entry.metadata().map_err(|e| GitError::AccessError {
                    message: e.to_string(),
                })?;
                total += metadata.len();
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod git_error {
        use super::*;

        #[test]
        fn not_found_on_name_is_ref_not_found() {
            let err = git2::Error::new(
                git2::ErrorCode::NotFound,
                git2::ErrorClass::Reference,
                "missing",
            );
            assert!(matches!(
                GitError::from_git2(err, "refs/heads/gone"),
                GitError::RefNotFound { refname } if refname == "refs/heads/gone"
            ));
        }

        #[test]
        fn not_found_on_sha_is_object_not_found() {
            let err = git2::Error::new(
                git2::ErrorCode::NotFound,
                git2::ErrorClass::Odb,
                "missing",
            );
            let sha = "8470d70da67355c9c009e4401746b1d5410af2e3";
            assert!(matches!(
                GitError::from_git2(err, sha),
                GitError::ObjectNotFound { oid } if oid == sha
            ));
        }

        #[test]
        fn not_found_on_sha256_is_object_not_found() {
            let err = git2::Error::new(
                git2::ErrorCode::NotFound,
                git2::ErrorClass::Odb,
                "missing",
            );
            let sha = "a".repeat(64);
            assert!(matches!(
                GitError::from_git2(err, &sha),
                GitError::ObjectNotFound { oid } if oid == sha
            ));
        }

        #[test]
        fn abbreviated_sha_is_ref_not_found() {
            let err = git2::Error::new(
                git2::ErrorCode::NotFound,
                git2::ErrorClass::Odb,
                "missing",
            );
            assert!(matches!(
                GitError::from_git2(err, "8470d70"),
                GitError::RefNotFound { .. }
            ));
        }

        #[test]
        fn invalid_spec_is_invalid_ref_name() {
            let err = git2::Error::new(
                git2::ErrorCode::InvalidSpec,
                git2::ErrorClass::Reference,
                "the given reference name 'a..b' is not valid",
            );
            let mapped: GitError = err.into();
            assert!(matches!(
                mapped,
                GitError::InvalidRefName { ref message } if message.contains("a..b")
            ));
        }

        #[test]
        fn locked_is_access_error() {
            let err = git2::Error::new(
                git2::ErrorCode::Locked,
                git2::ErrorClass::Reference,
                "index.lock exists",
            );
            let mapped = GitError::from_git2(err, "HEAD");
            assert!(matches!(mapped, GitError::AccessError { .. }));
            assert!(mapped.to_string().contains("locked"));
        }

        #[test]
        fn type_errors_convert() {
            let err: GitError = TypeError::InvalidOid("short".into()).into();
            assert!(matches!(err, GitError::InvalidOid { .. }));
            let err: GitError = TypeError::InvalidBranchName("bad".into()).into();
            assert!(matches!(err, GitError::InvalidRefName { .. }));
        }

        #[test]
        fn command_failed_display() {
            let err = GitError::CommandFailed {
                command: "git archive --format=tar".into(),
                message: "fatal: not a valid object name".into(),
            };
            assert_eq!(
                err.to_string(),
                "`git archive --format=tar` failed: fatal: not a valid object name"
            );
        }
    }

    mod diff_status {
        use super::*;

        #[test]
        fn maps_interesting_deltas() {
            assert_eq!(
                DiffStatus::from_delta(git2::Delta::Added),
                Some(DiffStatus::Added)
            );
            assert_eq!(
                DiffStatus::from_delta(git2::Delta::Renamed),
                Some(DiffStatus::Renamed)
            );
            assert_eq!(DiffStatus::from_delta(git2::Delta::Unmodified), None);
            assert_eq!(DiffStatus::from_delta(git2::Delta::Ignored), None);
        }

        #[test]
        fn codes() {
            assert_eq!(DiffStatus::Modified.code(), 'M');
            assert_eq!(DiffStatus::TypeChange.code(), 'T');
        }

        #[test]
        fn serializes_lowercase() {
            let json = serde_json::to_string(&DiffStatus::TypeChange).unwrap();
            assert_eq!(json, "\"typechange\"");
        }
    }

    #[test]
    fn archive_kind_args() {
        assert_eq!(ArchiveKind::Tar.as_arg(), "tar");
        assert_eq!(ArchiveKind::Zip.as_arg(), "zip");
    }
}
