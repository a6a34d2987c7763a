//! archive command - Export the tree at a ref as an archive

use std::path::Path;

use crate::cli::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Export an archive and print its path.
pub fn archive(
    ctx: &Context,
    ref_name: Option<&str>,
    format: Option<&str>,
    output_dir: Option<&Path>,
) -> Result<()> {
    let repo = ctx.open_repo()?;
    let cwd = ctx.cwd()?;
    let output_dir = output_dir.map(|dir| cwd.join(dir));

    let path = repo
        .archive_repo(ref_name, output_dir.as_deref(), format)
        .with_context(|| match ref_name {
            Some(r) => format!("Failed to archive '{}'", r),
            None => "Failed to archive default branch".to_string(),
        })?;

    if ctx.json {
        output::json(&serde_json::json!({ "path": path }))?;
    } else {
        output::result(path.display());
    }
    Ok(())
}
