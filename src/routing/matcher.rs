//! Route matching logic.
//!
//! # Responsibilities
//! - Classify patterns (exact, subtree, host-qualified)
//! - Decide whether a pattern matches a path
//! - Pick the most specific pattern among all candidates
//!
//! # Design Decisions
//! - Exact patterns match only the identical path
//! - Subtree patterns (trailing `/`) match themselves and every path below
//! - Longest matching pattern wins; keys are unique, so there are no ties
//!   and the winner does not depend on map iteration order
//! - No regex, no parameters: one linear scan over the table

/// Returns true if `pattern` is a subtree pattern.
pub fn is_subtree(pattern: &str) -> bool {
    pattern.ends_with('/')
}

/// Returns true if `pattern` names a host (does not start with `/`).
pub fn is_host_qualified(pattern: &str) -> bool {
    !pattern.starts_with('/')
}

/// Path component of a pattern, with any leading host removed.
pub fn pattern_path(pattern: &str) -> &str {
    match pattern.find('/') {
        Some(idx) => &pattern[idx..],
        None => "",
    }
}

/// Does `path` match `pattern`?
pub fn path_match(pattern: &str, path: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    if !is_subtree(pattern) {
        return pattern == path;
    }
    path.starts_with(pattern)
}

/// Find the longest pattern among `candidates` that matches `path`.
pub fn longest_match<'a, I, V>(candidates: I, path: &str) -> Option<(&'a str, &'a V)>
where
    I: IntoIterator<Item = (&'a String, &'a V)>,
    V: 'a,
{
    let mut best: Option<(&'a str, &'a V)> = None;
    for (pattern, value) in candidates {
        if !path_match(pattern, path) {
            continue;
        }
        match best {
            Some((current, _)) if current.len() >= pattern.len() => {}
            _ => best = Some((pattern.as_str(), value)),
        }
    }
    best
}
