//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--repo <path>`: Open exactly this repository (bare or not)
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--json`: Machine-readable output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// repokit - inspect git repositories: refs, archives, search, submodules
#[derive(Parser, Debug)]
#[command(name = "repokit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if repokit was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Path of the repository to open, instead of discovering it from the
    /// working directory
    #[arg(long, global = true)]
    pub repo: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    // ========== Refs ==========
    /// List local branch names
    Branches,

    /// List tags with the commits they point at
    Tags,

    /// List branch names followed by tag names
    Refs,

    /// List branches with their tip commits
    Heads,

    /// Print the default branch
    #[command(
        name = "default-branch",
        long_about = "Print the branch repokit treats as the default.\n\n\
            With a single branch, that branch is the default. Otherwise the branch \
            HEAD points at wins, then the preferred name (`master` unless the \
            repository config sets `default_branch`), then the first branch in \
            sorted order."
    )]
    DefaultBranch,

    // ========== Content ==========
    /// Export the tree at a ref as an archive
    #[command(
        name = "archive",
        long_about = "Export the tree at a ref as an archive and print its path.\n\n\
            The archive is written to <output-dir>/<repo>/<repo>-<sha>.<ext>. An \
            archive that already exists for the same commit and format is reused.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Archive the default branch as tar.gz into the configured storage dir
    repokit archive

    # Archive a tag as zip into /tmp
    repokit archive v1.2.0 --format zip --output-dir /tmp

FORMATS:
    tar.gz (tgz, gzip)    tar.bz2 (tbz, tbz2, tb2, bz2)    tar    zip
    Unknown names fall back to tar.gz."
    )]
    Archive {
        /// Ref to export (default branch if omitted)
        #[arg(value_name = "REF")]
        ref_name: Option<String>,

        /// Archive format
        #[arg(long, short)]
        format: Option<String>,

        /// Storage directory for archives
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Search file contents at a ref
    #[command(
        name = "search",
        long_about = "Search the text files at a ref for a string.\n\n\
            Matching is case-insensitive. Each hit is printed with surrounding \
            context lines (search.context_lines, 3 by default); nearby hits in the \
            same file are merged into one snippet."
    )]
    Search {
        /// Text to look for
        query: String,

        /// Ref to search (default branch if omitted)
        #[arg(long = "ref", value_name = "REF")]
        ref_name: Option<String>,
    },

    /// List submodules declared at a ref
    Submodules {
        /// Ref to inspect (default branch if omitted)
        #[arg(value_name = "REF")]
        ref_name: Option<String>,
    },

    // ========== Repository ==========
    /// Print the repository size in MiB
    Size,

    /// Summarize the repository
    Info,

    // ========== History ==========
    /// Show commit history
    Log {
        /// Starting ref (default branch if omitted)
        #[arg(value_name = "REF")]
        ref_name: Option<String>,

        /// Maximum number of commits
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,

        /// Commits to skip
        #[arg(long, default_value_t = 0)]
        skip: usize,

        /// Only commits touching this path
        #[arg(long)]
        path: Option<String>,
    },

    /// Count commits reachable from a ref
    Count {
        /// Ref to count from (default branch if omitted)
        #[arg(value_name = "REF")]
        ref_name: Option<String>,
    },

    /// Print the best common ancestor of two revisions
    #[command(name = "merge-base")]
    MergeBase {
        a: String,
        b: String,
    },

    /// List files changed between two revisions
    Diff {
        from: String,
        to: String,
    },

    // ========== Setup ==========
    /// Get, set, or list configuration values
    #[command(
        name = "config",
        after_help = "\
KEYS:
    archive.storage_path    global    directory archives are written under
    archive.format          global    default archive format
    search.context_lines    global    context lines around search hits
    default_branch          repo      preferred default branch name

WORKFLOW EXAMPLES:
    repokit config list
    repokit config set archive.format zip
    repokit config set default_branch main"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,
    },
    /// List all configuration values
    List,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
