//! Terraform flatmap encoding.
//!
//! Legacy state files store every resource attribute as a flat string map
//! whose keys encode the nesting: `network.0.fixed_ip_v4` is the
//! `fixed_ip_v4` field of the first element of the `network` list.
//!
//! [`expand`] rebuilds the nested structure from such a map and [`flatten`]
//! is its inverse. Map keys are not escaped, so a key containing `.` or made
//! only of digits does not survive `flatten` then `expand`; [`normalize`]
//! builds the nested view straight from nested input instead. Count sentinels like `network.#` or `tags.%` are ordinary
//! keys here; a node that has one of them next to index children therefore
//! expands to a map keyed by `"#"`, `"0"`, `"1"`, ...

use crate::error::TfInventoryError;
use crate::types::{ExpandedAttributes, FlatAttributes};
use serde_json::Value;
use std::collections::BTreeMap;

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '.';

/// Largest list index accepted. Gaps are filled with nulls, so the bound
/// caps the allocation a single key can cause.
pub const MAX_LIST_INDEX: usize = 65_535;

/// Largest number of list elements, gaps included, one expansion may
/// allocate across all of its lists.
pub const MAX_LIST_SLOTS: usize = 1 << 20;

/// A flat key that cannot be expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedKey {
    /// The offending key
    pub key: String,
    /// Why it was rejected
    pub reason: String,
}

impl MalformedKey {
    fn new(key: &str, reason: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Attach the owning resource, producing a `MalformedAttributeKey`.
    #[must_use]
    pub fn into_error(self, resource: &str) -> TfInventoryError {
        crate::err!(MalformedAttributeKey {
            resource: resource.to_string(),
            key: self.key,
            reason: self.reason,
        })
    }
}

#[derive(Debug, Default)]
struct Node<'a> {
    value: Option<&'a str>,
    children: BTreeMap<&'a str, Node<'a>>,
}

/// Expand a flat attribute map into nested maps and lists.
///
/// A node becomes a list only when every one of its children is an index;
/// the list is `max index + 1` long and gaps are `null`. Any named child
/// keeps the node a map. The top level is always a map.
///
/// # Errors
///
/// Returns the first malformed key in key order: empty segments, negative
/// or zero-padded indices, indices above [`MAX_LIST_INDEX`], and a path that
/// is both a value and the prefix of another key. Also fails when the lists
/// together would exceed [`MAX_LIST_SLOTS`] elements.
pub fn expand(attributes: &FlatAttributes) -> Result<ExpandedAttributes, MalformedKey> {
    let mut root = Node::default();

    for (key, value) in attributes {
        insert(&mut root, key, value)?;
    }

    let mut budget = MAX_LIST_SLOTS;
    let mut expanded = ExpandedAttributes::new();
    for (segment, child) in root.children {
        let value = to_value(child, segment, &mut budget)?;
        expanded.insert(segment.to_string(), value);
    }
    Ok(expanded)
}

fn insert<'a>(root: &mut Node<'a>, key: &'a str, value: &'a str) -> Result<(), MalformedKey> {
    let mut node = root;
    let mut segments = key.split(PATH_SEPARATOR).peekable();

    while let Some(segment) = segments.next() {
        validate_segment(key, segment)?;

        if node.value.is_some() {
            return Err(MalformedKey::new(
                key,
                "a prefix of this key is already used as a scalar value",
            ));
        }

        node = node.children.entry(segment).or_default();

        if segments.peek().is_none() {
            if !node.children.is_empty() {
                return Err(MalformedKey::new(
                    key,
                    "key is used both as a scalar value and as a prefix of other keys",
                ));
            }
            node.value = Some(value);
        }
    }

    Ok(())
}

fn validate_segment(key: &str, segment: &str) -> Result<(), MalformedKey> {
    if segment.is_empty() {
        return Err(MalformedKey::new(key, "empty path segment"));
    }

    if let Some(digits) = segment.strip_prefix('-') {
        if is_index(digits) {
            return Err(MalformedKey::new(key, format!("negative list index '{segment}'")));
        }
        return Ok(());
    }

    if is_index(segment) {
        if segment.len() > 1 && segment.starts_with('0') {
            return Err(MalformedKey::new(key, format!("non-canonical list index '{segment}'")));
        }
        match segment.parse::<usize>() {
            Ok(index) if index <= MAX_LIST_INDEX => {}
            _ => {
                return Err(MalformedKey::new(
                    key,
                    format!("list index '{segment}' exceeds {MAX_LIST_INDEX}"),
                ));
            }
        }
    }

    Ok(())
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn to_value(node: Node<'_>, path: &str, budget: &mut usize) -> Result<Value, MalformedKey> {
    if node.children.is_empty() {
        return Ok(node
            .value
            .map_or(Value::Null, |v| Value::String(v.to_string())));
    }

    if node.children.keys().all(|segment| is_index(segment)) {
        // Indices were bounded by validate_segment.
        let indexed: Vec<(usize, Node<'_>)> = node
            .children
            .into_iter()
            .filter_map(|(segment, child)| segment.parse().ok().map(|i| (i, child)))
            .collect();
        let len = indexed.iter().map(|(i, _)| i + 1).max().unwrap_or(0);

        if len > *budget {
            return Err(MalformedKey::new(
                path,
                format!("lists exceed {MAX_LIST_SLOTS} elements in total"),
            ));
        }
        *budget -= len;

        let mut list = vec![Value::Null; len];
        for (index, child) in indexed {
            list[index] = to_value(child, &format!("{path}{PATH_SEPARATOR}{index}"), budget)?;
        }
        return Ok(Value::Array(list));
    }

    let mut map = serde_json::Map::new();
    for (segment, child) in node.children {
        let value = to_value(child, &format!("{path}{PATH_SEPARATOR}{segment}"), budget)?;
        map.insert(segment.to_string(), value);
    }
    Ok(Value::Object(map))
}

/// Flatten nested attributes into flatmap encoding.
///
/// Strings are kept as-is, numbers and booleans are rendered with their
/// JSON text. Nulls and empty containers produce no key.
#[must_use]
pub fn flatten(expanded: &ExpandedAttributes) -> FlatAttributes {
    let mut flat = FlatAttributes::new();
    for (key, value) in expanded {
        flatten_into(&mut flat, key.clone(), value);
    }
    flat
}

fn flatten_into(flat: &mut FlatAttributes, prefix: String, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => {
            flat.insert(prefix, s.clone());
        }
        Value::Bool(b) => {
            flat.insert(prefix, b.to_string());
        }
        Value::Number(n) => {
            flat.insert(prefix, n.to_string());
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(flat, format!("{prefix}{PATH_SEPARATOR}{index}"), item);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                flatten_into(flat, format!("{prefix}{PATH_SEPARATOR}{key}"), item);
            }
        }
    }
}

/// Nested attributes as seen through the flat encoding, without going
/// through flat keys.
///
/// Numbers and booleans become their JSON text and null map entries are
/// dropped, as [`flatten`] does. Map keys are kept verbatim, so keys
/// containing `.` or made only of digits are preserved.
#[must_use]
pub fn normalize(expanded: &ExpandedAttributes) -> ExpandedAttributes {
    expanded
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), normalize_value(value)))
        .collect()
}

fn normalize_value(value: &Value) -> Value {
    match value {
        Value::Null | Value::String(_) => value.clone(),
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Number(n) => Value::String(n.to_string()),
        Value::Array(items) => Value::Array(items.iter().map(normalize_value).collect()),
        Value::Object(map) => Value::Object(normalize(map)),
    }
}
