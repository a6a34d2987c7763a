//! repokit - a thin, strongly typed wrapper around a git repository
//!
//! repokit opens a bare or non-bare repository and answers the questions a
//! code-hosting service keeps asking about it: which branches and tags exist,
//! which branch is the default, what the tree at a ref looks like as an
//! archive, where a string occurs, which submodules are pinned where, and how
//! big the repository is on disk.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to repository)
//! - [`repository`] - The wrapper: listing, archives, search, submodules, history
//! - [`core`] - Domain types, config, archive formats, and locking
//! - [`git`] - Single interface for all Git operations
//! - [`ui`] - User-facing output
//!
//! # Invariants
//!
//! 1. Only [`git`] talks to libgit2
//! 2. Refs and objects are never modified; archives are the only files written
//! 3. An archive file is either absent or complete, never partial

pub mod cli;
pub mod core;
pub mod git;
pub mod repository;
pub mod ui;
