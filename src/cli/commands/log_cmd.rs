//! log and count commands - Show and count commit history

use crate::cli::Context;
use crate::repository::LogOptions;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Show commits newest first.
pub fn log(
    ctx: &Context,
    ref_name: Option<String>,
    limit: usize,
    skip: usize,
    path: Option<String>,
) -> Result<()> {
    let repo = ctx.open_repo()?;
    let opts = LogOptions {
        ref_name,
        path,
        limit: Some(limit),
        offset: skip,
    };
    let commits = repo.log(&opts).context("Failed to read history")?;

    if ctx.json {
        output::json(&commits)?;
        return Ok(());
    }

    for commit in &commits {
        output::result(format!(
            "{} {} ({}, {})",
            commit.oid.short(7),
            commit.summary,
            commit.author_name,
            commit.author_time.format("%Y-%m-%d")
        ));
    }
    Ok(())
}

/// Print the number of commits reachable from a ref.
pub fn count(ctx: &Context, ref_name: Option<&str>) -> Result<()> {
    let repo = ctx.open_repo()?;
    let count = repo
        .commit_count(ref_name)
        .context("Failed to count commits")?;

    if ctx.json {
        output::json(&serde_json::json!({ "count": count }))?;
    } else {
        output::result(count);
    }
    Ok(())
}
