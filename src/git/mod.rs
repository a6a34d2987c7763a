//! git
//!
//! Single interface for all git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to git. All repository reads flow
//! through [`Git`]. No other module imports `git2` or parses files inside the
//! git directory.
//!
//! # Responsibilities
//!
//! - Repository opening (bare or with a working tree) and discovery
//! - Ref enumeration: branches, tags, arbitrary prefixes, HEAD
//! - Commit information, history walks, counts and merge bases
//! - Tree and blob reads, gitlink lookup
//! - Tree-to-tree diffs with line stats
//! - `git archive` streams and on-disk size
//!
//! # Invariants
//!
//! - No other module calls git2 directly
//! - All operations return strong types (Oid, BranchName, RefName)
//! - Refs whose names git would reject are never surfaced

mod interface;

pub use interface::{
    ArchiveKind, BlobEntry, CommitInfo, DiffEntry, DiffStatus, Git, GitError, RefEntry, RepoInfo,
    TagEntry, WalkOptions,
};
