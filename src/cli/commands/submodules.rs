//! submodules command - List submodules declared at a ref

use crate::cli::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// List submodules with their pinned commits.
pub fn submodules(ctx: &Context, ref_name: Option<&str>) -> Result<()> {
    let repo = ctx.open_repo()?;
    let submodules = repo
        .submodules(ref_name)
        .context("Failed to read submodules")?;

    if ctx.json {
        output::json(&submodules)?;
        return Ok(());
    }

    for sub in &submodules {
        let id = sub.id.as_ref().map(|id| id.as_str()).unwrap_or("-");
        output::result(format!(
            "{}\t{}\t{}\t{}",
            sub.name,
            sub.path,
            id,
            sub.url.as_deref().unwrap_or("")
        ));
    }
    Ok(())
}
