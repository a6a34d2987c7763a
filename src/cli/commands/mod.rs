//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens the repository through the [`Context`]
//! 2. Calls one [`crate::repository::Repository`] operation
//! 3. Formats and displays output, as text or JSON
//!
//! Handlers never write to the repository. `archive` and `config set` are
//! the only commands that write files at all.

mod archive;
mod compare;
mod completion;
mod config_cmd;
mod info;
mod log_cmd;
mod refs;
mod search;
mod submodules;

// Re-export command functions for testing and direct invocation
pub use archive::archive;
pub use compare::{diff, merge_base};
pub use completion::completion;
pub use config_cmd::{get as config_get, list as config_list, set as config_set};
pub use info::{info, size};
pub use log_cmd::{count, log};
pub use refs::{branches, default_branch, heads, refs, tags};
pub use search::search;
pub use submodules::submodules;

use crate::cli::args::{Command, ConfigAction};
use crate::cli::Context;
use crate::ui::output;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        // Refs
        Command::Branches => refs::branches(ctx),
        Command::Tags => refs::tags(ctx),
        Command::Refs => refs::refs(ctx),
        Command::Heads => refs::heads(ctx),
        Command::DefaultBranch => refs::default_branch(ctx),

        // Content
        Command::Archive {
            ref_name,
            format,
            output_dir,
        } => archive::archive(
            ctx,
            ref_name.as_deref(),
            format.as_deref(),
            output_dir.as_deref(),
        ),
        Command::Search { query, ref_name } => search::search(ctx, &query, ref_name.as_deref()),
        Command::Submodules { ref_name } => submodules::submodules(ctx, ref_name.as_deref()),

        // Repository
        Command::Size => info::size(ctx),
        Command::Info => info::info(ctx),

        // History
        Command::Log {
            ref_name,
            limit,
            skip,
            path,
        } => log_cmd::log(ctx, ref_name, limit, skip, path),
        Command::Count { ref_name } => log_cmd::count(ctx, ref_name.as_deref()),
        Command::MergeBase { a, b } => compare::merge_base(ctx, &a, &b),
        Command::Diff { from, to } => compare::diff(ctx, &from, &to),

        // Setup
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, &key),
            ConfigAction::Set { key, value } => config_cmd::set(ctx, &key, &value),
            ConfigAction::List => config_cmd::list(ctx),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Print plain names one per line, or as a JSON array.
fn print_names(ctx: &Context, names: &[String]) -> Result<()> {
    if ctx.json {
        output::json(names)?;
    } else if !names.is_empty() {
        output::result(names.join("\n"));
    }
    Ok(())
}
