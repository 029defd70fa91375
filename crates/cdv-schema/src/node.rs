//! # Schema Introspection
//!
//! Read-only helpers over a parsed JSON Schema document. The validator only
//! looks at a small subset of keywords here (`type`, `properties`, `items`,
//! `$ref`, and the `x-delimiter` extension); everything else is left to the
//! structural evaluator.
//!
//! Only local references (`#/...`) are followed. Reference chains are
//! bounded so a self-referencing schema cannot loop forever.

use serde_json::Value;

/// Schema extension attribute naming the array cell delimiter.
pub const DELIMITER_KEYWORD: &str = "x-delimiter";

/// Delimiter used for array cells when the schema does not declare one.
pub const DEFAULT_DELIMITER: &str = ",";

const MAX_REF_DEPTH: usize = 32;

/// Follow local `$ref` pointers starting at `node` until a concrete node is
/// reached. Unresolvable references return the last node reached.
pub fn resolve_ref<'a>(root: &'a Value, node: &'a Value) -> &'a Value {
    let mut current = node;
    for _ in 0..MAX_REF_DEPTH {
        let Some(pointer) = current
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(|r| r.strip_prefix('#'))
        else {
            return current;
        };
        match root.pointer(pointer) {
            Some(target) => current = target,
            None => return current,
        }
    }
    current
}

/// The declared `type` of a node.
///
/// For a type array such as `["integer", "null"]` the first non-null entry
/// wins.
pub fn declared_type(node: &Value) -> Option<&str> {
    match node.get("type")? {
        Value::String(s) => Some(s.as_str()),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null"),
        _ => None,
    }
}

/// Delimiter used to split an array-typed cell.
pub fn array_delimiter(node: &Value) -> &str {
    node.get(DELIMITER_KEYWORD)
        .and_then(Value::as_str)
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_DELIMITER)
}

/// The `items` sub-schema of an array node, if it is a single schema object.
pub fn items<'a>(root: &'a Value, node: &'a Value) -> Option<&'a Value> {
    let node = resolve_ref(root, node);
    node.get("items")
        .filter(|i| i.is_object())
        .map(|i| resolve_ref(root, i))
}

/// Named sub-schema under `properties`.
pub fn property<'a>(root: &'a Value, node: &'a Value, name: &str) -> Option<&'a Value> {
    let node = resolve_ref(root, node);
    node.get("properties")?
        .get(name)
        .map(|p| resolve_ref(root, p))
}

/// Whether a node is an array whose items are objects.
pub fn is_array_of_objects(root: &Value, node: &Value) -> bool {
    let node = resolve_ref(root, node);
    if declared_type(node) != Some("array") {
        return false;
    }
    items(root, node).is_some_and(|i| {
        declared_type(i) == Some("object") || i.get("properties").is_some()
    })
}

/// One dot-separated segment of a column name, with the schema it resolved to.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedSegment<'a> {
    /// Segment text.
    pub name: &'a str,
    /// Sub-schema for this segment, `None` once resolution has failed.
    pub schema: Option<&'a Value>,
    /// The segment is an array of objects; nested columns write into its
    /// first element.
    pub array_of_objects: bool,
}

/// Resolve a (possibly dotted) column name against the schema.
///
/// Each segment is looked up under the parent's `properties`, or under
/// `items.properties` when the parent is an array. Once a segment fails to
/// resolve, every later segment carries `schema: None`.
pub fn resolve_column<'a>(root: &'a Value, column: &'a str) -> Vec<ResolvedSegment<'a>> {
    let mut segments = Vec::new();
    let mut parent = Some(root);
    for name in column.split('.') {
        let schema = parent.and_then(|p| child(root, p, name));
        segments.push(ResolvedSegment {
            name,
            schema,
            array_of_objects: schema.is_some_and(|s| is_array_of_objects(root, s)),
        });
        parent = schema;
    }
    segments
}

fn child<'a>(root: &'a Value, parent: &'a Value, name: &str) -> Option<&'a Value> {
    property(root, parent, name).or_else(|| {
        let parent = resolve_ref(root, parent);
        if declared_type(parent) == Some("array") {
            items(root, parent).and_then(|i| property(root, i, name))
        } else {
            None
        }
    })
}

/// Walk a schema location (a JSON pointer that may pass through `$ref`
/// keywords, as evaluators report it) and return the node it designates.
pub fn lookup_location<'a>(root: &'a Value, location: &str) -> Option<&'a Value> {
    let mut current = root;
    for raw in location.split('/').skip(1) {
        let segment = unescape_pointer_segment(raw);
        if segment == "$ref" {
            current = resolve_ref(root, current);
            continue;
        }
        current = match current {
            Value::Object(map) => map.get(segment.as_str())?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Apply JSON pointer escaping (`~` is `~0`, `/` is `~1`).
pub fn escape_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Undo JSON pointer escaping (`~1` is `/`, `~0` is `~`).
pub fn unescape_pointer_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
