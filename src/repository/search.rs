//! repository::search
//!
//! Substring search over the blobs of a tree.

use serde::Serialize;
use tracing::debug;

use super::{Repository, RepositoryError};

/// A window of lines from one file that contains at least one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobSnippet {
    /// The ref that was searched
    pub ref_name: String,
    pub filename: String,
    /// 1-based line number of the first line in `lines`
    pub startline: usize,
    pub lines: Vec<String>,
}

impl BlobSnippet {
    /// The snippet's lines joined with `\n`.
    pub fn data(&self) -> String {
        self.lines.join("\n")
    }
}

impl Repository {
    /// Search every text blob at `ref_name` for `query`, case-insensitively.
    ///
    /// `ref_name` defaults to the default branch. Each match is shown with
    /// the configured number of context lines; windows that touch or overlap
    /// are merged. Results are ordered by filename, then start line.
    pub fn search_files(
        &self,
        query: &str,
        ref_name: Option<&str>,
    ) -> Result<Vec<BlobSnippet>, RepositoryError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let ref_name = self.ref_or_default(ref_name)?;
        let commit = self.git.resolve_revision(&ref_name)?;
        let context = self.config.context_lines();

        let mut snippets = Vec::new();
        self.git.for_each_blob(&commit, |path, content| {
            if content.contains(&0) {
                return;
            }
            let text = String::from_utf8_lossy(content);
            snippets.extend(
                find_windows(&text, query, context)
                    .into_iter()
                    .map(|(startline, lines)| BlobSnippet {
                        ref_name: ref_name.clone(),
                        filename: path.to_string(),
                        startline,
                        lines,
                    }),
            );
        })?;

        snippets.sort_by(|a, b| {
            a.filename
                .cmp(&b.filename)
                .then(a.startline.cmp(&b.startline))
        });
        debug!(query, %ref_name, results = snippets.len(), "searched blobs");
        Ok(snippets)
    }
}

/// Windows of `context` lines around each line containing `query`.
///
/// Returns `(1-based start line, lines)` pairs in file order.
fn find_windows(text: &str, query: &str, context: usize) -> Vec<(usize, Vec<String>)> {
    let lines: Vec<&str> = text.lines().collect();
    let needle = query.to_lowercase();

    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if !line.to_lowercase().contains(&needle) {
            continue;
        }
        let start = idx.saturating_sub(context);
        let end = (idx + context).min(lines.len() - 1);
        match ranges.last_mut() {
            Some((_, prev_end)) if start <= *prev_end + 1 => *prev_end = end,
            _ => ranges.push((start, end)),
        }
    }

    ranges
        .into_iter()
        .map(|(start, end)| {
            let window = lines[start..=end].iter().map(|l| l.to_string()).collect();
            (start + 1, window)
        })
        .collect()
}
