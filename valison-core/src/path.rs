//! Path resolution for nested data.
//!
//! A path such as `address.line1`, `items[0].sku` or `meta["display name"]`
//! is parsed once into a [`PropertyPath`], a flat list of property keys. Dotted
//! and bracketed segments normalize to the same list, so `a.b` and `a["b"]`
//! address the same location.
//!
//! Reads never fail: a missing or `null` intermediate node yields `None`.
//! Writes create intermediate objects on demand, replacing any non-container
//! value that is in the way below the root. The root itself is only promoted
//! to an object when it is `null`; a root that cannot hold the first segment
//! (a scalar, or an array addressed by a non-index key) is left untouched.
//!
//! License: MIT OR APACHE 2.0

use std::fmt;
use std::str::FromStr;

use log::debug;
use serde_json::{Map, Value};

use crate::errors::ValisonError;

/// A parsed property path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    raw: String,
    segments: Vec<String>,
}

impl PropertyPath {
    /// Parses `raw` into its segments.
    ///
    /// Bracket contents become a segment verbatim (minus one pair of matching
    /// quotes). Unmatched brackets, empty brackets and empty dotted segments
    /// are rejected with [`ValisonError::PathSyntax`]. The empty string parses
    /// to a path with no segments, which addresses the root itself.
    pub fn parse(raw: &str) -> Result<Self, ValisonError> {
        let fail = |reason: String| ValisonError::PathSyntax {
            path: raw.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut current = String::new();
        // True right after a `]`, where a `.` or `[` may follow without a name.
        let mut after_bracket = false;
        let mut chars = raw.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '.' => {
                    if current.is_empty() {
                        if !after_bracket {
                            return Err(fail(format!("empty segment at offset {}", pos)));
                        }
                    } else {
                        segments.push(std::mem::take(&mut current));
                    }
                    after_bracket = false;
                    if chars.peek().is_none() {
                        return Err(fail("path ends with '.'".to_string()));
                    }
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                    let quote = match chars.peek() {
                        Some(&(_, q)) if q == '"' || q == '\'' => {
                            chars.next();
                            Some(q)
                        }
                        _ => None,
                    };

                    let mut inner = String::new();
                    let mut closed = false;
                    while let Some((_, nc)) = chars.next() {
                        match quote {
                            Some(q) if nc == q => {
                                match chars.next() {
                                    Some((_, ']')) => closed = true,
                                    _ => {
                                        return Err(fail(format!(
                                            "expected ']' after closing quote of segment opened at offset {}",
                                            pos
                                        )))
                                    }
                                }
                                break;
                            }
                            None if nc == ']' => {
                                closed = true;
                                break;
                            }
                            _ => inner.push(nc),
                        }
                    }

                    if !closed {
                        return Err(fail(format!("unmatched '[' at offset {}", pos)));
                    }
                    if inner.is_empty() {
                        return Err(fail(format!("empty brackets at offset {}", pos)));
                    }
                    segments.push(inner);
                    after_bracket = true;
                    continue;
                }
                ']' => return Err(fail(format!("unmatched ']' at offset {}", pos))),
                _ => {
                    if after_bracket {
                        return Err(fail(format!(
                            "expected '.' or '[' after ']' at offset {}",
                            pos
                        )));
                    }
                    current.push(c);
                }
            }
        }

        if !current.is_empty() {
            segments.push(current);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The path exactly as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Reads the value at this path, or `None` when any step along the way is
    /// missing or `null`.
    pub fn get<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut node = root;
        for segment in &self.segments {
            node = child(node, segment)?;
        }
        Some(node)
    }

    /// Writes `value` at this path, creating intermediate objects as needed,
    /// and returns `root` for chaining. A root path, or a root that cannot hold
    /// the first segment, leaves `root` untouched.
    pub fn set<'a>(&self, root: &'a mut Value, value: Value) -> &'a mut Value {
        let Some((leaf, parents)) = self.segments.split_last() else {
            return root;
        };

        let first = leaf_or_next(parents, leaf, 0);
        if !root.is_null() && !holds(root, first) {
            debug!("Not writing '{}': the root cannot hold key '{}'.", self.raw, first);
            return root;
        }

        let mut node: &mut Value = &mut *root;
        ensure_container(node, first);
        for (i, segment) in parents.iter().enumerate() {
            let next = leaf_or_next(parents, leaf, i + 1);
            node = slot(node, segment);
            ensure_container(node, next);
        }
        *slot(node, leaf) = value;

        root
    }
}

impl FromStr for PropertyPath {
    type Err = ValisonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parses `path` and reads from `root` in one call.
pub fn get<'a>(root: &'a Value, path: &str) -> Result<Option<&'a Value>, ValisonError> {
    Ok(PropertyPath::parse(path)?.get(root))
}

/// Parses `path` and writes into `root` in one call.
pub fn set<'a>(root: &'a mut Value, path: &str, value: Value) -> Result<&'a mut Value, ValisonError> {
    let path = PropertyPath::parse(path)?;
    Ok(path.set(root, value))
}

fn child<'a>(node: &'a Value, segment: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn leaf_or_next<'s>(parents: &'s [String], leaf: &'s str, index: usize) -> &'s str {
    parents.get(index).map(String::as_str).unwrap_or(leaf)
}

/// Makes sure `node` can hold the key `next`. Arrays are kept when the key is
/// an index; everything else that is not an object becomes an empty object.
fn ensure_container(node: &mut Value, next: &str) {
    if !holds(node, next) {
        *node = Value::Object(Map::new());
    }
}

fn holds(node: &Value, key: &str) -> bool {
    match node {
        Value::Object(_) => true,
        Value::Array(_) => key.parse::<usize>().is_ok(),
        _ => false,
    }
}

/// Returns the slot for `segment` inside a container prepared by
/// [`ensure_container`], inserting `null` when it does not exist yet.
fn slot<'a>(node: &'a mut Value, segment: &str) -> &'a mut Value {
    let index = match node {
        Value::Array(_) => segment.parse::<usize>().ok(),
        _ => None,
    };
    if index.is_none() && !node.is_object() {
        *node = Value::Object(Map::new());
    }

    match (node, index) {
        (Value::Array(items), Some(index)) => {
            if index >= items.len() {
                items.resize(index + 1, Value::Null);
            }
            &mut items[index]
        }
        (Value::Object(map), _) => map.entry(segment.to_string()).or_insert(Value::Null),
        _ => unreachable!("slot container is prepared above"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn segs(raw: &str) -> Vec<String> {
        PropertyPath::parse(raw).unwrap().segments().to_vec()
    }

    #[test]
    fn dotted_and_bracketed_segments_normalize_alike() {
        assert_eq!(segs("a.b.c"), vec!["a", "b", "c"]);
        assert_eq!(segs("a[\"b c\"]"), vec!["a", "b c"]);
        assert_eq!(segs("a['b'].c"), vec!["a", "b", "c"]);
        assert_eq!(segs("items[0].sku"), vec!["items", "0", "sku"]);
        assert_eq!(segs("[0][1]"), vec!["0", "1"]);
        assert_eq!(segs("a[b.c]"), vec!["a", "b.c"]);
    }

    #[test]
    fn empty_path_is_the_root() {
        let path = PropertyPath::parse("").unwrap();
        assert!(path.is_root());
        let mut data = json!({"a": 1});
        assert_eq!(path.get(&data), Some(&json!({"a": 1})));
        path.set(&mut data, json!("ignored"));
        assert_eq!(data, json!({"a": 1}));
    }

    #[test]
    fn malformed_paths_fail_fast() {
        for bad in ["a[0", "a]", "a..b", ".a", "a.", "a[]", "a[\"b]", "a[0]b", "a['b'x]"] {
            let err = PropertyPath::parse(bad).unwrap_err();
            assert!(
                matches!(err, ValisonError::PathSyntax { .. }),
                "expected a syntax error for {:?}, got {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn get_stops_at_missing_or_null_nodes() {
        let data = json!({"address": {"line1": "X", "zip": null}, "tags": ["a", "b"], "gone": null});
        assert_eq!(get(&data, "address.line1").unwrap(), Some(&json!("X")));
        assert_eq!(get(&data, "address.zip").unwrap(), Some(&Value::Null));
        assert_eq!(get(&data, "tags[1]").unwrap(), Some(&json!("b")));
        assert_eq!(get(&data, "tags[7]").unwrap(), None);
        assert_eq!(get(&data, "gone.deeper").unwrap(), None);
        assert_eq!(get(&data, "address.line1.more").unwrap(), None);
        assert_eq!(get(&data, "nothing.here").unwrap(), None);
    }

    #[test]
    fn set_creates_and_overwrites_intermediates() {
        let mut data = json!({"a": 5});
        set(&mut data, "a.b.c", json!(1)).unwrap();
        assert_eq!(data, json!({"a": {"b": {"c": 1}}}));

        let mut data = json!({});
        set(&mut data, "list[2]", json!("x")).unwrap();
        assert_eq!(data, json!({"list": {"2": "x"}}));

        let mut data = json!({"list": [1, 2]});
        set(&mut data, "list[3]", json!(4)).unwrap();
        assert_eq!(data, json!({"list": [1, 2, null, 4]}));

        let mut data = json!({"list": [1, 2]});
        set(&mut data, "list.name", json!("n")).unwrap();
        assert_eq!(data, json!({"list": {"name": "n"}}));
    }

    #[test]
    fn set_leaves_unsuitable_roots_alone() {
        let mut data = json!([1, 2]);
        set(&mut data, "name", json!("x")).unwrap();
        assert_eq!(data, json!([1, 2]));

        let mut data = json!("text");
        set(&mut data, "a.b", json!(1)).unwrap();
        assert_eq!(data, json!("text"));

        let mut data = json!([1, 2]);
        set(&mut data, "[1]", json!(9)).unwrap();
        assert_eq!(data, json!([1, 9]));
    }

    #[test]
    fn set_returns_root_for_chaining() {
        let mut data = json!(null);
        let root = set(&mut data, "x", json!(true)).unwrap();
        root["y"] = json!(false);
        assert_eq!(data, json!({"x": true, "y": false}));
    }

    #[test]
    fn writing_back_a_read_value_changes_nothing() {
        let original = json!({"a": {"b": [1, {"c": "d"}]}, "e": null});
        for raw in ["a", "a.b", "a.b[1].c", "e"] {
            let mut data = original.clone();
            let path = PropertyPath::parse(raw).unwrap();
            let current = path.get(&data).cloned().unwrap();
            path.set(&mut data, current);
            assert_eq!(data, original, "round trip through {}", raw);
        }
    }
}
