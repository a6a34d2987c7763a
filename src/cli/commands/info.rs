//! info and size commands - Summarize the repository

use serde::Serialize;

use crate::cli::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};

#[derive(Debug, Serialize)]
struct Summary {
    name: String,
    path: String,
    bare: bool,
    empty: bool,
    default_branch: Option<String>,
    branches: usize,
    tags: usize,
    size_mib: f64,
}

/// Print the repository size in MiB.
pub fn size(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;
    let size = repo.size().context("Failed to measure repository")?;

    if ctx.json {
        output::json(&serde_json::json!({ "size_mib": size }))?;
    } else {
        output::result(format!("{:.2} MiB", size));
    }
    Ok(())
}

/// Print name, location, state, default branch and size.
pub fn info(ctx: &Context) -> Result<()> {
    let repo = ctx.open_repo()?;

    let summary = Summary {
        name: repo.name().to_string(),
        path: repo.path().display().to_string(),
        bare: repo.raw().info().is_bare,
        empty: repo.is_empty().context("Failed to inspect refs")?,
        default_branch: repo
            .root_ref()
            .context("Failed to determine default branch")?,
        branches: repo.branch_names().context("Failed to list branches")?.len(),
        tags: repo.tag_names().context("Failed to list tags")?.len(),
        size_mib: repo.size().context("Failed to measure repository")?,
    };

    if ctx.json {
        output::json(&summary)?;
        return Ok(());
    }

    let yes_no = |b: bool| if b { "yes" } else { "no" };
    output::result(format!("Name: {}", summary.name));
    output::result(format!("Path: {}", summary.path));
    output::result(format!("Bare: {}", yes_no(summary.bare)));
    output::result(format!("Empty: {}", yes_no(summary.empty)));
    output::result(format!(
        "Default branch: {}",
        summary.default_branch.as_deref().unwrap_or("(none)")
    ));
    output::result(format!("Branches: {}", summary.branches));
    output::result(format!("Tags: {}", summary.tags));
    output::result(format!("Size: {:.2} MiB", summary.size_mib));
    Ok(())
}
