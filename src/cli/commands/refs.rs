//! refs commands - List branches, tags and refs, and show the default branch

use super::print_names;
use crate::cli::Context;
use crate::ui::output;
use anyhow::{bail, Context as _, Result};

/// List local branch names.
pub fn branches(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;
    let names = repo.branch_names().context("Failed to list branches")?;
    print_names(ctx, &names)
}

/// List tags with their target commits.
pub fn tags(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;
    let tags = repo.tags().context("Failed to list tags")?;

    if ctx.json {
        output::json(&tags)?;
        return Ok(());
    }

    for tag in &tags {
        let message = tag
            .message
            .as_deref()
            .and_then(|m| m.lines().next())
            .unwrap_or("");
        output::result(format!("{}\t{}\t{}", tag.name, tag.target.short(7), message).trim_end());
    }
    Ok(())
}

/// List branch names followed by tag names.
pub fn refs(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;
    let names = repo.ref_names().context("Failed to list refs")?;
    print_names(ctx, &names)
}

/// List branches with their tip commits.
pub fn heads(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;
    let heads = repo.heads().context("Failed to list branches")?;

    if ctx.json {
        output::json(&heads)?;
        return Ok(());
    }

    for head in &heads {
        output::result(format!(
            "{}\t{}\t{}",
            head.name,
            head.commit.oid.short(7),
            head.commit.summary
        ));
    }
    Ok(())
}

/// Print the default branch.
pub fn default_branch(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;
    let branch = repo
        .discover_default_branch()
        .context("Failed to determine default branch")?;

    if ctx.json {
        output::json(&serde_json::json!({ "default_branch": branch }))?;
        return Ok(());
    }

    match branch {
        Some(name) => output::result(name),
        None => bail!("Repository has no branches"),
    }
    Ok(())
}
