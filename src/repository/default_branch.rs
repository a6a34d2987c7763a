//! repository::default_branch
//!
//! The rule for picking a repository's default branch.
//!
//! Kept free of I/O so it can be checked directly against branch lists.

/// Pick the default branch from the repository's branches.
///
/// In order:
/// 1. no branches: `None`
/// 2. a single branch: that branch
/// 3. the branch HEAD points at, if it exists
/// 4. `preferred`, if it exists
/// 5. the first branch in sorted order
///
/// `branches` must be sorted.
///
/// # Example
///
/// ```
/// use repokit::repository::default_branch::discover;
///
/// let branches = vec!["master".to_string(), "stable".to_string()];
/// assert_eq!(discover(&branches, Some("stable"), "master"), Some("stable".to_string()));
/// assert_eq!(discover(&branches, None, "master"), Some("master".to_string()));
/// ```
pub fn discover(branches: &[String], head: Option<&str>, preferred: &str) -> Option<String> {
    match branches {
        [] => None,
        [only] => Some(only.clone()),
        _ => {
            let exists = |name: &str| branches.iter().any(|b| b == name);
            head.filter(|h| exists(h))
                .or_else(|| Some(preferred).filter(|p| exists(p)))
                .map(str::to_string)
                .or_else(|| branches.first().cloned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_branches() {
        assert_eq!(discover(&[], Some("master"), "master"), None);
    }

    #[test]
    fn single_branch_wins_regardless_of_head() {
        let branches = names(&["stable"]);
        assert_eq!(discover(&branches, Some("master"), "master"), Some("stable".into()));
        assert_eq!(discover(&branches, None, "master"), Some("stable".into()));
    }

    #[test]
    fn head_beats_master() {
        let branches = names(&["master", "stable"]);
        assert_eq!(discover(&branches, Some("stable"), "master"), Some("stable".into()));
    }

    #[test]
    fn master_when_head_is_dangling() {
        let branches = names(&["master", "stable"]);
        assert_eq!(discover(&branches, Some("gone"), "master"), Some("master".into()));
    }

    #[test]
    fn preferred_name_is_configurable() {
        let branches = names(&["develop", "main", "master"]);
        assert_eq!(discover(&branches, None, "main"), Some("main".into()));
    }

    #[test]
    fn first_sorted_as_last_resort() {
        let branches = names(&["feature", "stable"]);
        assert_eq!(discover(&branches, None, "master"), Some("feature".into()));
    }
}
