//! repository::submodules
//!
//! `.gitmodules` parsing and submodule listing.
//!
//! The parser understands the subset of git's config syntax that
//! `.gitmodules` files use in practice: `[submodule "name"]` sections,
//! `key = value` pairs, `#`/`;` comments and blank lines. Other sections are
//! ignored.

use serde::Serialize;

use super::{Repository, RepositoryError};
use crate::core::types::Oid;

const GITMODULES: &str = ".gitmodules";

/// A submodule declared at a ref, with the commit its gitlink records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submodule {
    pub name: String,
    /// Commit recorded in the tree; `None` if `.gitmodules` names a path
    /// that is not a gitlink
    pub id: Option<Oid>,
    pub path: String,
    pub url: Option<String>,
}

/// One `[submodule "..."]` section of a `.gitmodules` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitmodulesEntry {
    pub name: String,
    pub path: Option<String>,
    pub url: Option<String>,
}

impl Repository {
    /// Submodules declared in `.gitmodules` at `ref_name`, in file order.
    ///
    /// `ref_name` defaults to the default branch. Sections without a `path`
    /// are skipped. A tree without `.gitmodules` has no submodules.
    pub fn submodules(&self, ref_name: Option<&str>) -> Result<Vec<Submodule>, RepositoryError> {
        let ref_name = self.ref_or_default(ref_name)?;
        let commit = self.git.resolve_revision(&ref_name)?;

        let Some(text) = self.git.read_path_as_string(&commit, GITMODULES)? else {
            return Ok(Vec::new());
        };

        parse_gitmodules(&text)
            .into_iter()
            .filter_map(|entry| {
                let path = entry.path?;
                Some((entry.name, path, entry.url))
            })
            .map(|(name, path, url)| -> Result<Submodule, RepositoryError> {
                let id = self.git.gitlink_at(&commit, &path)?;
                Ok(Submodule { name, id, path, url })
            })
            .collect()
    }
}

/// Parse the sections of a `.gitmodules` file, in file order.
///
/// # Example
///
/// ```
/// use repokit::repository::parse_gitmodules;
///
/// let entries = parse_gitmodules(
///     "[submodule \"rack\"]\n\tpath = rack\n\turl = git://github.com/chneukirchen/rack.git\n",
/// );
/// assert_eq!(entries[0].name, "rack");
/// assert_eq!(entries[0].path.as_deref(), Some("rack"));
/// ```
pub fn parse_gitmodules(text: &str) -> Vec<GitmodulesEntry> {
    let mut entries: Vec<GitmodulesEntry> = Vec::new();
    // Whether the section being read is a submodule section.
    let mut in_submodule = false;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_submodule = false;
            if let Some(name) = header.trim().strip_prefix("submodule") {
                if let Some(name) = unquote(name.trim()) {
                    entries.push(GitmodulesEntry {
                        name: name.to_string(),
                        ..Default::default()
                    });
                    in_submodule = true;
                }
            }
            continue;
        }

        if !in_submodule {
            continue;
        }
        let (Some(entry), Some((key, value))) = (entries.last_mut(), line.split_once('=')) else {
            continue;
        };
        let value = unquote(value.trim()).unwrap_or(value.trim()).to_string();
        match key.trim().to_ascii_lowercase().as_str() {
            "path" => entry.path = Some(value),
            "url" => entry.url = Some(value),
            _ => {}
        }
    }

    entries
}

/// Strip surrounding double quotes, `None` if `s` is not quoted.
fn unquote(s: &str) -> Option<&str> {
    s.strip_prefix('"').and_then(|s| s.strip_suffix('"'))
}
