//! Fragment paths into decoded documents
//!
//! A fragment such as `#components/schemas/User` is split on `/` into
//! property names that are looked up one after another. Empty segments are
//! dropped, so `#/a//b` and `#a/b` are the same path. There is no escaping:
//! property names containing `/` cannot be addressed.

use crate::error::{Error, Result};
use serde_json::Value;

/// Split a fragment into its non-empty path segments
pub fn fragment_segments(fragment: &str) -> Vec<&str> {
    fragment
        .strip_prefix('#')
        .unwrap_or(fragment)
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Walk `fragment` inside `document`.
///
/// An empty fragment (`""` or `"#"`) selects the whole document. Objects are
/// indexed by key and arrays by decimal index; any segment that does not
/// exist on the current node fails the lookup, as does a non-empty fragment
/// made only of separators.
pub fn get_nested_value<'a>(document: &'a Value, fragment: &str) -> Result<&'a Value> {
    let trimmed = fragment.strip_prefix('#').unwrap_or(fragment);
    if trimmed.is_empty() {
        return Ok(document);
    }

    let segments = fragment_segments(trimmed);
    if segments.is_empty() {
        return Err(Error::pointer_resolution(document, fragment));
    }

    segments.into_iter().try_fold(document, |current, segment| {
        step(current, segment).ok_or_else(|| Error::pointer_resolution(document, fragment))
    })
}

fn step<'a>(current: &'a Value, segment: &str) -> Option<&'a Value> {
    match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "x": {"y": 42},
            "someSpec": {
                "withArray": ["a", "b", "c"],
                "withNull": null,
                "withBoolean": false
            }
        })
    }

    #[test]
    fn test_fragment_segments() {
        assert_eq!(fragment_segments("#x/y"), vec!["x", "y"]);
        assert_eq!(fragment_segments("#/x/y"), vec!["x", "y"]);
        assert_eq!(fragment_segments("x//y/"), vec!["x", "y"]);
        assert!(fragment_segments("#").is_empty());
        assert!(fragment_segments("").is_empty());
    }

    #[test]
    fn test_nested_lookup() {
        let doc = document();
        assert_eq!(get_nested_value(&doc, "#x/y").unwrap(), &json!(42));
        assert_eq!(get_nested_value(&doc, "/x/y").unwrap(), &json!(42));
        assert_eq!(get_nested_value(&doc, "#x").unwrap(), &json!({"y": 42}));
        assert_eq!(get_nested_value(&doc, "#someSpec/withArray/1").unwrap(), &json!("b"));
    }

    #[test]
    fn test_present_null_and_false_values_resolve() {
        let doc = document();
        assert_eq!(get_nested_value(&doc, "#someSpec/withNull").unwrap(), &Value::Null);
        assert_eq!(get_nested_value(&doc, "#someSpec/withBoolean").unwrap(), &json!(false));
    }

    #[test]
    fn test_empty_fragment_selects_document() {
        let doc = document();
        assert_eq!(get_nested_value(&doc, "").unwrap(), &doc);
        assert_eq!(get_nested_value(&doc, "#").unwrap(), &doc);
    }

    #[test]
    fn test_missing_segments_fail() {
        let doc = document();
        for fragment in ["#x/z", "#nope", "#x/y/deeper", "#someSpec/withArray/7", "#someSpec/withArray/first"] {
            let err = get_nested_value(&doc, fragment).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::PointerResolution, "fragment {}", fragment);
            assert!(err.to_string().contains(fragment));
        }
    }

    #[test]
    fn test_separator_only_fragment_is_malformed() {
        let err = get_nested_value(&document(), "#///").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PointerResolution);
    }
}
