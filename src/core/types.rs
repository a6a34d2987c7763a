//! core::types
//!
//! Strong types for the names and ids that cross the git boundary.
//!
//! # Types
//!
//! - [`BranchName`] - Validated short name of a branch or tag
//! - [`Oid`] - Git object identifier (SHA)
//! - [`RefName`] - Validated full reference name
//!
//! Invalid values cannot be constructed. Listing operations rely on this to
//! filter out refs that git itself would refuse to create.
//!
//! # Examples
//!
//! ```
//! use repokit::core::types::{BranchName, Oid, RefName};
//!
//! let branch = BranchName::new("feature/my-branch").unwrap();
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! let refname = RefName::for_branch(&branch);
//! assert_eq!(refname.short_name(), "feature/my-branch");
//!
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! # let _ = oid;
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),
}

const FORBIDDEN_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];

/// Rules shared by short names and full ref names (`git check-ref-format`).
///
/// Returns a description of the first violated rule, `what` being the noun
/// used in the message ("branch name" or "ref name").
fn refname_violation(name: &str, what: &str) -> Option<String> {
    if name.is_empty() {
        return Some(format!("{what} cannot be empty"));
    }
    if name.starts_with('/') {
        return Some(format!("{what} cannot start with '/'"));
    }
    if name.ends_with('/') {
        return Some(format!("{what} cannot end with '/'"));
    }
    if name.ends_with('.') {
        return Some(format!("{what} cannot end with '.'"));
    }
    for seq in ["..", "@{", "//"] {
        if name.contains(seq) {
            return Some(format!("{what} cannot contain '{seq}'"));
        }
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Some(format!("{what} cannot contain '{c}'"));
    }
    if name.chars().any(|c| c.is_ascii_control()) {
        return Some(format!("{what} cannot contain control characters"));
    }
    name.split('/').find_map(|component| {
        if component.starts_with('.') {
            Some("path component cannot start with '.'".to_string())
        } else if component.ends_with(".lock") {
            Some("path component cannot end with '.lock'".to_string())
        } else {
            None
        }
    })
}

/// A validated short name of a branch or tag (`master`, `v1.2.0`).
///
/// Beyond the shared refname rules, a short name cannot be exactly `@`
/// and cannot start with `-`.
///
/// # Example
///
/// ```
/// use repokit::core::types::BranchName;
///
/// let name = BranchName::new("2_3_notes_fix").unwrap();
/// assert_eq!(name.as_str(), "2_3_notes_fix");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("branch.lock").is_err());
/// assert!(BranchName::new("branch from space").is_err());
/// assert!(BranchName::new("@").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name == "@" {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot be '@' (reserved)".into(),
            ));
        }
        if name.starts_with('-') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot start with '-'".into(),
            ));
        }
        if let Some(reason) = refname_violation(&name, "branch name") {
            return Err(TypeError::InvalidBranchName(reason));
        }
        Ok(Self(name))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A git object identifier (SHA-1 or SHA-256), normalized to lowercase.
///
/// # Example
///
/// ```
/// use repokit::core::types::Oid;
///
/// let oid = Oid::new("BCF03B5DE6C33F5A2A3E3E8EF2F8A6F1E8E2D3C4").unwrap();
/// assert_eq!(oid.as_str(), "bcf03b5de6c33f5a2a3e3e8ef2f8a6f1e8e2d3c4");
/// assert_eq!(oid.short(7), "bcf03b5");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a full hex OID.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(Self(oid))
    }

    /// First `len` characters, or the whole id if it is shorter.
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated full reference name such as `refs/heads/master`.
///
/// # Example
///
/// ```
/// use repokit::core::types::{BranchName, RefName};
///
/// let tag = BranchName::new("v1.2.0").unwrap();
/// let refname = RefName::for_tag(&tag);
/// assert_eq!(refname.as_str(), "refs/tags/v1.2.0");
/// assert!(refname.is_tag_ref());
/// assert_eq!(refname.short_name(), "v1.2.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    pub const HEADS_PREFIX: &'static str = "refs/heads/";
    pub const TAGS_PREFIX: &'static str = "refs/tags/";

    /// Create a new validated ref name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name violates git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        match refname_violation(&name, "ref name") {
            Some(reason) => Err(TypeError::InvalidRefName(reason)),
            None => Ok(Self(name)),
        }
    }

    /// `refs/heads/<branch>`.
    pub fn for_branch(branch: &BranchName) -> Self {
        Self(format!("{}{}", Self::HEADS_PREFIX, branch.as_str()))
    }

    /// `refs/tags/<tag>`.
    pub fn for_tag(tag: &BranchName) -> Self {
        Self(format!("{}{}", Self::TAGS_PREFIX, tag.as_str()))
    }

    /// Strip a prefix from the ref name and return the remainder.
    pub fn strip_prefix(&self, prefix: &str) -> Option<&str> {
        self.0.strip_prefix(prefix)
    }

    pub fn is_branch_ref(&self) -> bool {
        self.0.starts_with(Self::HEADS_PREFIX)
    }

    pub fn is_tag_ref(&self) -> bool {
        self.0.starts_with(Self::TAGS_PREFIX)
    }

    /// The name without its `refs/heads/` or `refs/tags/` namespace.
    ///
    /// Refs outside those namespaces are returned unchanged.
    pub fn short_name(&self) -> &str {
        self.strip_prefix(Self::HEADS_PREFIX)
            .or_else(|| self.strip_prefix(Self::TAGS_PREFIX))
            .unwrap_or(&self.0)
    }

    /// Get the ref name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod branch_name {
        use super::*;

        #[test]
        fn accepts_common_names() {
            for name in [
                "master",
                "stable",
                "2_3_notes_fix",
                "feature/foo",
                "v2.2.0pre",
                "user@feature",
                "a/b/c/d",
            ] {
                assert!(BranchName::new(name).is_ok(), "{name} should be valid");
            }
        }

        #[test]
        fn rejects_leading_dot_or_dash() {
            assert!(BranchName::new(".hidden").is_err());
            assert!(BranchName::new("foo/.hidden").is_err());
            assert!(BranchName::new("-flag").is_err());
        }

        #[test]
        fn rejects_lock_suffix_and_trailing_separators() {
            assert!(BranchName::new("branch.lock").is_err());
            assert!(BranchName::new("foo/bar.lock").is_err());
            assert!(BranchName::new("branch/").is_err());
            assert!(BranchName::new("branch.").is_err());
        }

        #[test]
        fn rejects_forbidden_sequences() {
            assert!(BranchName::new("bad..path").is_err());
            assert!(BranchName::new("foo@{bar").is_err());
            assert!(BranchName::new("foo//bar").is_err());
            assert!(BranchName::new("@").is_err());
        }

        #[test]
        fn rejects_spaces_and_specials() {
            assert!(BranchName::new(" branch-from-space").is_err());
            for c in FORBIDDEN_CHARS {
                let name = format!("has{c}char");
                assert!(BranchName::new(&name).is_err(), "{name:?} should be invalid");
            }
            assert!(BranchName::new("has\ttab").is_err());
            assert!(BranchName::new("has\x7fDEL").is_err());
        }

        #[test]
        fn error_names_the_rule() {
            let err = BranchName::new("bad..path").unwrap_err();
            assert_eq!(
                err,
                TypeError::InvalidBranchName("branch name cannot contain '..'".into())
            );
        }

        #[test]
        fn orders_lexically() {
            let mut names = vec![
                BranchName::new("master").unwrap(),
                BranchName::new("2_3_notes_fix").unwrap(),
                BranchName::new("feature").unwrap(),
            ];
            names.sort();
            let names: Vec<_> = names.iter().map(BranchName::as_str).collect();
            assert_eq!(names, ["2_3_notes_fix", "feature", "master"]);
        }

        #[test]
        fn deserialize_validates() {
            let parsed: Result<BranchName, _> = serde_json::from_str("\"ok/name\"");
            assert!(parsed.is_ok());
            let parsed: Result<BranchName, _> = serde_json::from_str("\"bad name\"");
            assert!(parsed.is_err());
        }
    }

    mod oid {
        use super::*;

        #[test]
        fn accepts_sha1_and_sha256() {
            assert!(Oid::new("8470d70da67355c9c009e4401746b1d5410af2e3").is_ok());
            assert!(Oid::new("a".repeat(64)).is_ok());
        }

        #[test]
        fn normalizes_to_lowercase() {
            let oid = Oid::new("8470D70DA67355C9C009E4401746B1D5410AF2E3").unwrap();
            assert_eq!(oid.as_str(), "8470d70da67355c9c009e4401746b1d5410af2e3");
        }

        #[test]
        fn short_form() {
            let oid = Oid::new("8470d70da67355c9c009e4401746b1d5410af2e3").unwrap();
            assert_eq!(oid.short(7), "8470d70");
            assert_eq!(oid.short(100), oid.as_str());
        }

        #[test]
        fn rejects_abbreviations_and_non_hex() {
            assert!(Oid::new("").is_err());
            assert!(Oid::new("bcf03b5").is_err());
            assert!(Oid::new("xyz123def4567890abc123def4567890abc12345").is_err());
        }
    }

    mod ref_name {
        use super::*;

        #[test]
        fn constructors() {
            let name = BranchName::new("feature/foo").unwrap();
            let head = RefName::for_branch(&name);
            assert_eq!(head.as_str(), "refs/heads/feature/foo");
            assert!(head.is_branch_ref());
            assert!(!head.is_tag_ref());

            let tag = RefName::for_tag(&name);
            assert_eq!(tag.as_str(), "refs/tags/feature/foo");
            assert!(tag.is_tag_ref());
        }

        #[test]
        fn short_name_strips_known_namespaces() {
            assert_eq!(RefName::new("refs/heads/master").unwrap().short_name(), "master");
            assert_eq!(RefName::new("refs/tags/v1.0").unwrap().short_name(), "v1.0");
            assert_eq!(
                RefName::new("refs/remotes/origin/master").unwrap().short_name(),
                "refs/remotes/origin/master"
            );
        }

        #[test]
        fn rejects_malformed() {
            assert!(RefName::new("").is_err());
            assert!(RefName::new("/refs/heads/main").is_err());
            assert!(RefName::new("refs/heads/").is_err());
            assert!(RefName::new("refs/heads/main.lock").is_err());
            assert!(RefName::new("refs//heads/main").is_err());
        }
    }
}
