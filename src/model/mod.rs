//! The assembled contract model: resources, resource methods, sub-resource
//! locators and resource parameters, plus the string-processing helpers they
//! share for path templates and MIME types.
//!
//! Model objects are built once from the declaration graph and are read-only
//! afterwards. Parent chains are threaded down explicitly at construction
//! time, so no model object holds a back-pointer and no global state is
//! consulted while building.

pub mod locator;
pub mod method;
pub mod param;
pub mod resource;

pub use locator::SubResourceLocator;
pub use method::{ContentTypeSupport, EntityParameter, ResourceMethod};
pub use param::{ParameterKind, ResourceParameter};
pub use resource::{Resource, RootResource, SubResource};

/// Collapses every `{name:regex}` template parameter in `path` to `{name}`,
/// leaving literal text untouched. Nested braces inside the regex (as in
/// `{id:[0-9]{4}}`) are consumed as part of the constraint.
pub fn strip_regex_constraints(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        if c != '{' {
            out.push(c);
            continue;
        }
        let mut depth = 1;
        let mut inner = String::new();
        for c in chars.by_ref() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            inner.push(c);
        }
        let name = inner.split(':').next().unwrap_or("").trim();
        out.push('{');
        out.push_str(name);
        out.push('}');
    }
    out
}

/// Normalizes a single path segment: regex constraints stripped, exactly one
/// leading `/`, no trailing `/`. An empty or root-only segment normalizes to
/// the empty string so concatenation never produces double slashes.
pub fn normalize_segment(segment: &str) -> String {
    let stripped = strip_regex_constraints(segment);
    let trimmed = stripped.trim_start_matches('/').trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    format!("/{}", trimmed)
}

/// Joins path segments root-to-leaf, normalizing each.
pub fn join_path(segments: &[String]) -> String {
    let joined: String = segments.iter().map(|s| normalize_segment(s)).collect();
    if joined.is_empty() {
        "/".to_string()
    } else {
        joined
    }
}

/// Derives the servlet mapping pattern for a full path: truncated at the
/// first template parameter with a trailing wildcard, or the path unchanged
/// when it has no parameters.
pub fn servlet_pattern(fullpath: &str) -> String {
    match fullpath.find('{') {
        Some(idx) => format!("{}*", &fullpath[..idx]),
        None => fullpath.to_string(),
    }
}

/// Normalizes a MIME type to lowercase `type/subtype`, dropping parameters.
/// Falls back to the raw string when the value is not parseable.
pub fn normalize_mime(raw: &str) -> String {
    let base = raw.split(';').next().unwrap_or(raw).trim();
    let mut halves = base.splitn(2, '/');
    match (halves.next(), halves.next()) {
        (Some(t), Some(s)) if !t.trim().is_empty() && !s.trim().is_empty() => {
            format!(
                "{}/{}",
                t.trim().to_ascii_lowercase(),
                s.trim().to_ascii_lowercase()
            )
        }
        _ => raw.to_string(),
    }
}

/// The wildcard MIME set used when a resource declares nothing.
pub fn default_mime_types() -> Vec<String> {
    vec!["*/*".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strip_regex_constraints() {
        assert_eq!(strip_regex_constraints("{id:[0-9]+}"), "{id}");
        assert_eq!(strip_regex_constraints("/users/{id:[0-9]+}/posts"), "/users/{id}/posts");
        assert_eq!(strip_regex_constraints("/plain/path"), "/plain/path");
        assert_eq!(strip_regex_constraints("{name}"), "{name}");
    }

    #[test]
    fn test_strip_regex_constraints_nested_braces() {
        assert_eq!(strip_regex_constraints("/code/{id:[0-9]{4}}"), "/code/{id}");
    }

    #[test]
    fn test_normalize_segment() {
        assert_eq!(normalize_segment("/a/"), "/a");
        assert_eq!(normalize_segment("b"), "/b");
        assert_eq!(normalize_segment("/c/"), "/c");
        assert_eq!(normalize_segment("/"), "");
        assert_eq!(normalize_segment(""), "");
    }

    #[test]
    fn test_join_path_no_double_slashes() {
        let segments = vec!["/a/".to_string(), "b".to_string(), "/c/".to_string()];
        assert_eq!(join_path(&segments), "/a/b/c");
    }

    #[test]
    fn test_join_path_idempotent() {
        let once = join_path(&["/a/".to_string(), "b".to_string()]);
        let twice = join_path(&[once.clone()]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_join_path_empty_is_root() {
        assert_eq!(join_path(&[]), "/");
        assert_eq!(join_path(&["/".to_string()]), "/");
    }

    #[test]
    fn test_servlet_pattern_truncates_at_first_parameter() {
        assert_eq!(servlet_pattern("/a/{id}/b"), "/a/*");
        assert_eq!(servlet_pattern("/users/{id}"), "/users/*");
    }

    #[test]
    fn test_servlet_pattern_unchanged_without_parameters() {
        assert_eq!(servlet_pattern("/a/b"), "/a/b");
    }

    #[test]
    fn test_normalize_mime() {
        assert_eq!(normalize_mime("Application/JSON"), "application/json");
        assert_eq!(normalize_mime("text/xml; charset=utf-8"), "text/xml");
        // Unparseable values fall back to the raw string.
        assert_eq!(normalize_mime("garbage"), "garbage");
        assert_eq!(normalize_mime("/half"), "/half");
    }
}
