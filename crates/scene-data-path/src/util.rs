use crate::types::Path;

/// Joins path steps back into the dotted form.
pub fn format_path(path: &[String]) -> String {
    path.join(".")
}

/// Check if a path points to the root value.
pub fn is_root(path: &[String]) -> bool {
    path.is_empty()
}

/// Check if `parent` path contains the `child` path.
pub fn is_child(parent: &[String], child: &[String]) -> bool {
    parent.len() < child.len() && child.starts_with(parent)
}

/// Returns `true` when `prefix` equals `path` or is one of its ancestors.
pub fn is_prefix(prefix: &[String], path: &[String]) -> bool {
    path.starts_with(prefix)
}

/// Get the parent path of a given path, `None` for the root.
pub fn parent(path: &[String]) -> Option<Path> {
    path.split_last().map(|(_, rest)| rest.to_vec())
}

/// Check if a string represents a valid non-negative integer array index.
pub fn is_index(step: &str) -> bool {
    if step.is_empty() {
        return false;
    }
    let bytes = step.as_bytes();
    // First char can't be leading zero unless it's just "0"
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|&b| b.is_ascii_digit())
}

/// Parses an array index step.
pub fn parse_index(step: &str) -> Option<usize> {
    if !is_index(step) {
        return None;
    }
    step.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::as_path;

    #[test]
    fn test_is_index() {
        assert!(is_index("0"));
        assert!(is_index("123"));
        assert!(!is_index("-1"));
        assert!(!is_index("01"));
        assert!(!is_index("x"));
        assert!(!is_index(""));
    }

    #[test]
    fn test_prefix_relations() {
        let parent_path = as_path("a.b");
        let child = as_path("a.b.c");
        assert!(is_child(&parent_path, &child));
        assert!(!is_child(&child, &parent_path));
        assert!(!is_child(&child, &child));
        assert!(is_prefix(&child, &child));
        assert!(!is_prefix(&as_path("a.bc"), &child));
    }

    #[test]
    fn test_parent_and_format() {
        assert_eq!(parent(&as_path("a.b.c")), Some(as_path("a.b")));
        assert_eq!(parent(&[]), None);
        assert_eq!(format_path(&as_path("a.b.0")), "a.b.0");
    }
}
