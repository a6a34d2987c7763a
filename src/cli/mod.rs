//! cli
//!
//! Command-line interface layer for repokit.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the tracing subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, builds a [`Context`]
//! from the global flags and dispatches to a handler, which opens a
//! [`Repository`] and formats what it returns.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use tracing_subscriber::EnvFilter;

use crate::repository::Repository;
use crate::ui::output::Verbosity;

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Explicit repository path.
    pub repo: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// Emit JSON instead of text.
    pub json: bool,
}

impl Context {
    /// Effective working directory.
    pub fn cwd(&self) -> Result<PathBuf> {
        match &self.cwd {
            Some(cwd) => Ok(cwd.clone()),
            None => std::env::current_dir().context("Failed to determine current directory"),
        }
    }

    /// Open the repository named by `--repo`, or the one containing the
    /// working directory.
    pub fn open_repo(&self) -> Result<Repository> {
        let cwd = self.cwd()?;
        let repo = match &self.repo {
            Some(path) => Repository::new(cwd.join(path)),
            None => Repository::discover(&cwd),
        };
        repo.context("Failed to open repository")
    }

    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    let ctx = Context {
        cwd: cli.cwd.clone(),
        repo: cli.repo.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
        json: cli.json,
    };

    commands::dispatch(cli.command, &ctx)
}

/// Log to stderr, filtered by `RUST_LOG` when set.
fn init_tracing(debug: bool) {
    let default = if debug { "repokit=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cwd_override() {
        let ctx = Context {
            cwd: Some(PathBuf::from("/srv/repos")),
            ..Default::default()
        };
        assert_eq!(ctx.cwd().unwrap(), PathBuf::from("/srv/repos"));
    }

    #[test]
    fn verbosity_from_flags() {
        let ctx = Context {
            quiet: true,
            debug: true,
            ..Default::default()
        };
        assert_eq!(ctx.verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn open_repo_outside_repository_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        let ctx = Context {
            cwd: Some(temp.path().to_path_buf()),
            repo: Some(PathBuf::from("missing.git")),
            ..Default::default()
        };
        let err = ctx.open_repo().unwrap_err();
        assert!(err.to_string().contains("Failed to open repository"));
    }
}
