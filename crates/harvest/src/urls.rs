// ABOUTME: URL resolution helpers: absolute detection, link resolution and lookup path joining.
// ABOUTME: Relative references are joined against a base with standard RFC 3986 semantics.

use url::Url;

/// Returns true if `url` carries a network location (`scheme://host...`).
pub fn is_absolute(url: &str) -> bool {
    Url::parse(url).map(|u| u.has_host()).unwrap_or(false)
}

/// Resolve a followed link against `base`.
///
/// Empty paths and absolute URLs come back unchanged. When `base` is not a
/// valid URL the path is returned as-is and the fetch reports the problem.
pub fn resolve(base: &str, path: &str) -> String {
    if path.is_empty() || is_absolute(path) {
        return path.to_string();
    }
    join(base, path)
}

/// Join a lookup path onto a schema's base URL. An empty path means the base itself.
pub fn join(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_string();
    }
    match Url::parse(base).and_then(|b| b.join(path)) {
        Ok(joined) => joined.to_string(),
        Err(_) => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_relative_against_directory() {
        assert_eq!(resolve("http://host/a/", "b"), "http://host/a/b");
    }

    #[test]
    fn resolve_absolute_passthrough() {
        assert_eq!(resolve("http://host", "http://other/x"), "http://other/x");
    }

    #[test]
    fn resolve_empty_is_unchanged() {
        assert_eq!(resolve("http://host", ""), "");
    }

    #[test]
    fn resolve_root_relative_with_query() {
        assert_eq!(resolve("http://localhost", "/?page=2"), "http://localhost/?page=2");
        assert_eq!(resolve("http://localhost", "links"), "http://localhost/links");
    }

    #[test]
    fn resolve_replaces_last_segment() {
        assert_eq!(resolve("http://host/a/b", "c?x=1#top"), "http://host/a/c?x=1#top");
        assert_eq!(resolve("http://host/a/b/", "../c"), "http://host/a/c");
    }

    #[test]
    fn resolve_without_base_keeps_path() {
        assert_eq!(resolve("", "links"), "links");
    }

    #[test]
    fn join_empty_path_is_base() {
        assert_eq!(join("http://localhost", ""), "http://localhost");
    }

    #[test]
    fn is_absolute_requires_host() {
        assert!(is_absolute("https://example.com/x"));
        assert!(!is_absolute("/x"));
        assert!(!is_absolute("mailto:someone@example.com"));
    }
}
