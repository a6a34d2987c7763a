//! merge-base and diff commands - Compare two revisions

use crate::cli::Context;
use crate::repository::DiffStatus;
use crate::ui::output;
use anyhow::{bail, Context as _, Result};

/// Print the merge base of two revisions.
pub fn merge_base(ctx: &Context, a: &str, b: &str) -> Result<()> {
    let repo = ctx.open_repo()?;
    let base = repo
        .merge_base_commit(a, b)
        .with_context(|| format!("Failed to compare '{}' and '{}'", a, b))?;

    if ctx.json {
        output::json(&serde_json::json!({ "merge_base": base }))?;
        return Ok(());
    }

    match base {
        Some(oid) => output::result(oid),
        None => bail!("'{}' and '{}' have no common ancestor", a, b),
    }
    Ok(())
}

/// List changed files with line counts.
pub fn diff(ctx: &Context, from: &str, to: &str) -> Result<()> {
    let repo = ctx.open_repo()?;
    let entries = repo
        .diff(from, to)
        .with_context(|| format!("Failed to diff '{}'..'{}'", from, to))?;

    if ctx.json {
        output::json(&entries)?;
        return Ok(());
    }

    for entry in &entries {
        let old = entry.old_path.as_deref().unwrap_or("");
        let new = entry.new_path.as_deref().unwrap_or("");
        let path = match entry.status {
            DiffStatus::Renamed | DiffStatus::Copied => format!("{} -> {}", old, new),
            DiffStatus::Deleted => old.to_string(),
            _ => new.to_string(),
        };
        output::result(format!(
            "{}\t{}\t+{} -{}",
            entry.status.code(),
            path,
            entry.additions,
            entry.deletions
        ));
    }
    Ok(())
}
