//! PathPrefixer - maps logical paths onto storage paths under an optional root

/// Separator used in storage paths, on every platform
pub const SEPARATOR: char = '/';

/// Normalize a logical path
///
/// - Drops empty and `.` segments (so `a//b/./c/` becomes `a/b/c`)
/// - Resolves `..` against earlier segments, never climbing above the root
/// - Never yields leading or trailing separators; the root is `""`
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split(SEPARATOR) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    segments.join("/")
}

/// Maps caller-visible paths to the paths stored in the table
///
/// With prefix `root`, the logical path `a/b.txt` is stored as `root/a/b.txt`.
/// Without a prefix, logical and storage paths are identical after
/// normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathPrefixer {
    /// Normalized prefix including its trailing separator, or empty
    prefix: String,
}

impl PathPrefixer {
    /// Create a prefixer; an empty (or all-separator) prefix means none
    pub fn new(prefix: &str) -> Self {
        let normalized = normalize_path(prefix);
        let prefix = if normalized.is_empty() {
            normalized
        } else {
            format!("{}{}", normalized, SEPARATOR)
        };

        Self { prefix }
    }

    /// Logical path -> storage path
    pub fn prefix_path(&self, path: &str) -> String {
        let normalized = normalize_path(path);
        if normalized.is_empty() {
            return self.root_path().to_string();
        }
        format!("{}{}", self.prefix, normalized)
    }

    /// Storage path of a directory, with a trailing separator (`""` for the
    /// unprefixed root)
    pub fn prefix_directory_path(&self, path: &str) -> String {
        let prefixed = self.prefix_path(path);
        if prefixed.is_empty() {
            prefixed
        } else {
            format!("{}{}", prefixed, SEPARATOR)
        }
    }

    /// Storage path -> logical path
    ///
    /// Exact inverse of [`PathPrefixer::prefix_path`]. Paths outside the prefix
    /// (the prefix directory itself and its ancestors) map to the root `""`.
    pub fn strip_prefix(&self, storage_path: &str) -> String {
        match storage_path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.to_string(),
            None => String::new(),
        }
    }

    /// Storage path of the logical root: the prefix without its separator
    fn root_path(&self) -> &str {
        self.prefix.strip_suffix(SEPARATOR).unwrap_or(&self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_path("a//b/./c/"), "a/b/c");
        assert_eq!(normalize_path("/a/b"), "a/b");
        assert_eq!(normalize_path("a/../b"), "b");
        assert_eq!(normalize_path("../../a"), "a");
        assert_eq!(normalize_path("."), "");
        assert_eq!(normalize_path(""), "");
    }

    #[test]
    fn test_without_prefix() {
        let prefixer = PathPrefixer::new("");
        assert_eq!(prefixer.prefix_path("a/b.txt"), "a/b.txt");
        assert_eq!(prefixer.prefix_path("/a//b.txt"), "a/b.txt");
        assert_eq!(prefixer.prefix_path(""), "");
        assert_eq!(prefixer.prefix_directory_path(""), "");
        assert_eq!(prefixer.prefix_directory_path("a"), "a/");
        assert_eq!(prefixer.strip_prefix("a/b.txt"), "a/b.txt");
    }

    #[test]
    fn test_with_prefix() {
        let prefixer = PathPrefixer::new("/tenants//one/");
        assert_eq!(prefixer, PathPrefixer::new("tenants/one"));
        assert_eq!(prefixer.prefix_path("a/b.txt"), "tenants/one/a/b.txt");
        assert_eq!(prefixer.prefix_path(""), "tenants/one");
        assert_eq!(prefixer.prefix_directory_path(""), "tenants/one/");
        assert_eq!(prefixer.strip_prefix("tenants/one/a/b.txt"), "a/b.txt");
        assert_eq!(prefixer.strip_prefix("tenants/one"), "");
        assert_eq!(prefixer.strip_prefix("tenants"), "");
    }

    proptest! {
        #[test]
        fn prefix_round_trip(
            prefix in "[a-z]{1,8}(/[a-z]{1,8}){0,2}",
            segments in prop::collection::vec("[a-zA-Z0-9_.-]{1,10}", 1..5),
        ) {
            let segments: Vec<String> = segments
                .into_iter()
                .filter(|s| s != "." && s != "..")
                .collect();
            prop_assume!(!segments.is_empty());
            let logical = segments.join("/");

            let prefixer = PathPrefixer::new(&prefix);
            prop_assert_eq!(prefixer.strip_prefix(&prefixer.prefix_path(&logical)), logical);
        }
    }
}
