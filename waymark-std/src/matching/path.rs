//! Matching a request path against a single pattern.

use waymark_core::{ParameterKind, PathPart, PathSegment, RouteParameter, RoutePattern, RouteValues};

/// Split a request path into segments.
///
/// A leading slash and a single trailing slash are ignored; the root path has
/// no segments.
pub fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

/// Match `path` against `pattern`, returning the extracted route values.
///
/// - Literal segments compare ASCII case-insensitively.
/// - A parameter captures one non-empty segment.
/// - A catch-all captures the rest of the path, slashes included.
/// - Missing trailing segments are allowed for optional parameters,
///   catch-alls and parameters with a default.
/// - Complex segments (`{name}.{ext}`) are matched right to left.
/// - Pattern defaults fill every value the path did not supply.
///
/// Constraints are not checked here.
pub fn match_pattern(pattern: &RoutePattern, path: &str) -> Option<RouteValues> {
    let segments = split_path(path);
    let mut values = RouteValues::new();
    let mut consumed_rest = false;

    for (index, segment) in pattern.path_segments().iter().enumerate() {
        let Some(text) = segments.get(index) else {
            if !accepts_missing(segment) {
                return None;
            }
            continue;
        };

        match segment.single_part() {
            Some(PathPart::Literal(literal)) => {
                if !literal.eq_ignore_ascii_case(text) {
                    return None;
                }
            }
            Some(PathPart::Parameter(parameter)) if parameter.is_catch_all() => {
                let rest = segments[index..].join("/");
                if !rest.is_empty() {
                    values.insert(parameter.name(), rest);
                }
                consumed_rest = true;
                break;
            }
            Some(PathPart::Parameter(parameter)) => {
                if text.is_empty() {
                    return None;
                }
                values.insert(parameter.name(), (*text).to_string());
            }
            None => {
                if !match_complex(segment.parts(), text, &mut values) {
                    return None;
                }
            }
        }
    }

    if !consumed_rest && segments.len() > pattern.path_segments().len() {
        return None;
    }

    for (name, value) in pattern.defaults().iter() {
        if !values.contains_key(name) {
            values.insert(name, value.clone());
        }
    }
    Some(values)
}

fn accepts_missing(segment: &PathSegment) -> bool {
    match segment.single_part() {
        Some(PathPart::Parameter(parameter)) => {
            parameter.kind() != ParameterKind::Standard || parameter.has_default()
        }
        _ => false,
    }
}

// Parts are consumed from the right. Each literal binds to its last
// occurrence that still leaves room for the parameter to its right.
fn match_complex(parts: &[PathPart], text: &str, values: &mut RouteValues) -> bool {
    let mut end = text.len();
    let mut pending: Option<&RouteParameter> = None;

    for part in parts.iter().rev() {
        match part {
            PathPart::Parameter(parameter) => pending = Some(parameter),
            PathPart::Literal(literal) => {
                let start = match pending {
                    Some(_) => {
                        if end == 0 {
                            return false;
                        }
                        match rfind_ignore_ascii_case(text, end - 1, literal) {
                            Some(start) => start,
                            None => return false,
                        }
                    }
                    None => {
                        let Some(start) = end.checked_sub(literal.len()) else {
                            return false;
                        };
                        match text.get(start..end) {
                            Some(tail) if tail.eq_ignore_ascii_case(literal) => start,
                            _ => return false,
                        }
                    }
                };

                if let Some(parameter) = pending.take() {
                    let captured = &text[start + literal.len()..end];
                    if captured.is_empty() {
                        return false;
                    }
                    values.insert(parameter.name(), captured.to_string());
                }
                end = start;
            }
        }
    }

    match pending {
        Some(parameter) => {
            let captured = &text[..end];
            if captured.is_empty() {
                return false;
            }
            values.insert(parameter.name(), captured.to_string());
            true
        }
        None => end == 0,
    }
}

// Last start position such that `needle` fits within `text[..limit]`.
fn rfind_ignore_ascii_case(text: &str, limit: usize, needle: &str) -> Option<usize> {
    let last = limit.checked_sub(needle.len())?;
    (0..=last).rev().find(|&start| {
        text.get(start..start + needle.len())
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(needle))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use waymark_core::RoutePatternBuilder;

    fn values(pairs: &[(&str, &str)]) -> RouteValues {
        pairs
            .iter()
            .map(|(k, v)| (*k, (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_split_path() {
        assert!(split_path("/").is_empty());
        assert!(split_path("").is_empty());
        assert_eq!(split_path("/a/b/"), ["a", "b"]);
        assert_eq!(split_path("a//b"), ["a", "", "b"]);
    }

    #[test]
    fn test_literals_are_case_insensitive() {
        let pattern = RoutePatternBuilder::new()
            .literal("Products")
            .literal("all")
            .build()
            .unwrap();

        assert_eq!(match_pattern(&pattern, "/products/ALL"), Some(values(&[])));
        assert!(match_pattern(&pattern, "/products").is_none());
        assert!(match_pattern(&pattern, "/products/all/extra").is_none());
    }

    #[test]
    fn test_root_pattern() {
        let pattern = RoutePatternBuilder::new().build().unwrap();
        assert!(match_pattern(&pattern, "/").is_some());
        assert!(match_pattern(&pattern, "/a").is_none());
    }

    #[test]
    fn test_parameters_capture_segments() {
        let pattern = RoutePatternBuilder::new()
            .literal("products")
            .parameter("id")
            .build()
            .unwrap();

        assert_eq!(
            match_pattern(&pattern, "/products/42"),
            Some(values(&[("id", "42")]))
        );
        assert!(match_pattern(&pattern, "/products//").is_none());
        assert!(match_pattern(&pattern, "/products").is_none());
    }

    #[test]
    fn test_defaults_and_optional_fill_missing_segments() {
        let pattern = RoutePatternBuilder::new()
            .parameter_with_default("controller", "Home")
            .parameter_with_default("action", "Index")
            .optional("id")
            .build()
            .unwrap();

        assert_eq!(
            match_pattern(&pattern, "/"),
            Some(values(&[("controller", "Home"), ("action", "Index")]))
        );
        assert_eq!(
            match_pattern(&pattern, "/blog/post/7"),
            Some(values(&[("controller", "blog"), ("action", "post"), ("id", "7")]))
        );
    }

    #[test]
    fn test_non_parameter_defaults_are_added() {
        let pattern = RoutePatternBuilder::new()
            .literal("about")
            .default_value("page", "about")
            .build()
            .unwrap();

        assert_eq!(
            match_pattern(&pattern, "/about"),
            Some(values(&[("page", "about")]))
        );
    }

    #[test]
    fn test_catch_all_takes_the_rest() {
        let pattern = RoutePatternBuilder::new()
            .literal("files")
            .catch_all("path")
            .build()
            .unwrap();

        assert_eq!(
            match_pattern(&pattern, "/files/a/b/c.txt"),
            Some(values(&[("path", "a/b/c.txt")]))
        );
        assert_eq!(match_pattern(&pattern, "/files"), Some(values(&[])));
    }

    #[test]
    fn test_complex_segment_matches_right_to_left() {
        let pattern = RoutePatternBuilder::new()
            .literal("files")
            .segment(|s| s.parameter("name").literal(".").parameter("ext"))
            .build()
            .unwrap();

        assert_eq!(
            match_pattern(&pattern, "/files/archive.tar.gz"),
            Some(values(&[("name", "archive.tar"), ("ext", "gz")]))
        );
        assert_eq!(
            match_pattern(&pattern, "/files/a.."),
            Some(values(&[("name", "a"), ("ext", ".")]))
        );
        assert!(match_pattern(&pattern, "/files/noext").is_none());
        assert!(match_pattern(&pattern, "/files/.gz").is_none());
    }

    #[test]
    fn test_complex_segment_with_literal_edges() {
        let pattern = RoutePatternBuilder::new()
            .segment(|s| s.literal("v").parameter("version").literal("-beta"))
            .build()
            .unwrap();

        assert_eq!(
            match_pattern(&pattern, "/V2-BETA"),
            Some(values(&[("version", "2")]))
        );
        assert!(match_pattern(&pattern, "/v2").is_none());
        assert!(match_pattern(&pattern, "/x2-beta").is_none());
    }
}
