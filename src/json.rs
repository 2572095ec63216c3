// src/json.rs
// Read-only, path-query view over upstream JSON payloads. The bilibili
// responses are deeply nested and only partially stable, so everything here
// degrades to a safe default instead of failing.

use serde_json::Value;

static NULL: Value = Value::Null;

/// Walk `root` along a dotted path. Numeric segments index into arrays
/// (`"major.article.covers.0"`).
pub fn pluck<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cur = root;
    for seg in path.split('.') {
        cur = match cur {
            Value::Object(map) => map.get(seg)?,
            Value::Array(arr) => arr.get(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(cur)
}

/// Like `pluck`, but missing paths resolve to JSON null.
pub fn at<'a>(root: &'a Value, path: &str) -> &'a Value {
    pluck(root, path).unwrap_or(&NULL)
}

pub fn exists(root: &Value, path: &str) -> bool {
    pluck(root, path).is_some()
}

/// String at `path`, or "" when missing or not a string.
pub fn str_at(root: &Value, path: &str) -> String {
    match pluck(root, path) {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Integer at `path`, or 0. Accepts numeric strings, which the platform
/// uses for some id fields.
pub fn i64_at(root: &Value, path: &str) -> i64 {
    match pluck(root, path) {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

/// Array at `path`, or the empty slice.
pub fn array_at<'a>(root: &'a Value, path: &str) -> &'a [Value] {
    match pluck(root, path) {
        Some(Value::Array(arr)) => arr.as_slice(),
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dotted_paths_and_array_indices() {
        let v = json!({"a": {"b": [{"c": "x"}, {"c": "y"}]}});
        assert_eq!(str_at(&v, "a.b.0.c"), "x");
        assert_eq!(str_at(&v, "a.b.1.c"), "y");
        assert!(exists(&v, "a.b.1"));
        assert!(!exists(&v, "a.b.2"));
        assert!(!exists(&v, "a.z"));
    }

    #[test]
    fn scalars_default_safely() {
        let v = json!({"n": 7, "s": "42", "t": "hi", "nil": null});
        assert_eq!(i64_at(&v, "n"), 7);
        assert_eq!(i64_at(&v, "s"), 42);
        assert_eq!(i64_at(&v, "t"), 0);
        assert_eq!(i64_at(&v, "missing"), 0);
        assert_eq!(str_at(&v, "t"), "hi");
        assert_eq!(str_at(&v, "n"), "");
        assert_eq!(str_at(&v, "nil"), "");
    }

    #[test]
    fn arrays_default_to_empty() {
        let v = json!({"xs": [1, 2], "o": {}});
        assert_eq!(array_at(&v, "xs").len(), 2);
        assert!(array_at(&v, "o").is_empty());
        assert!(array_at(&v, "missing").is_empty());
    }
}
