//! search command - Search file contents at a ref

use crate::cli::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Search for `query` and print each snippet grep-style.
///
/// Lines print as `file:line:text`; snippets are separated by `--`.
pub fn search(ctx: &Context, query: &str, ref_name: Option<&str>) -> Result<()> {
    let repo = ctx.open_repo()?;
    let snippets = repo
        .search_files(query, ref_name)
        .context("Failed to search repository")?;

    if ctx.json {
        output::json(&snippets)?;
        return Ok(());
    }

    for (idx, snippet) in snippets.iter().enumerate() {
        if idx > 0 {
            output::result("--");
        }
        for (offset, line) in snippet.lines.iter().enumerate() {
            output::result(format!(
                "{}:{}:{}",
                snippet.filename,
                snippet.startline + offset,
                line
            ));
        }
    }

    if snippets.is_empty() {
        output::print(format!("No matches for '{}'", query), ctx.verbosity());
    }
    Ok(())
}
