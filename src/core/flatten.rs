use crate::domain::model::{is_object_list, FlatRecord, Record, Scalar};
use serde_json::{map, Map, Value};

pub const KEY_SEPARATOR: &str = ".";
pub const LIST_SEPARATOR: &str = "|";

/// One open mapping on the traversal stack.
struct Frame<'a> {
    prefix: Option<String>,
    entries: map::Iter<'a>,
}

impl Frame<'_> {
    fn qualify(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) if !prefix.is_empty() => format!("{}{}{}", prefix, KEY_SEPARATOR, key),
            _ => key.to_string(),
        }
    }
}

pub fn flatten(record: &Record) -> FlatRecord {
    flatten_map(&record.data)
}

/// Depth-first over nested mappings with an explicit stack, so output keys
/// follow source order and nesting depth never grows the call stack.
pub fn flatten_map(data: &Map<String, Value>) -> FlatRecord {
    let mut flat = FlatRecord::new();
    let mut stack = vec![Frame {
        prefix: None,
        entries: data.iter(),
    }];

    while let Some(frame) = stack.last_mut() {
        let Some((key, value)) = frame.entries.next() else {
            stack.pop();
            continue;
        };
        let path = frame.qualify(key);

        match value {
            Value::Object(nested) => stack.push(Frame {
                prefix: Some(path),
                entries: nested.iter(),
            }),
            Value::Array(items) => flat.insert(path, Scalar::String(collapse_list(items))),
            Value::Null => flat.insert(path, Scalar::Null),
            Value::Bool(b) => flat.insert(path, Scalar::Bool(*b)),
            Value::Number(n) => flat.insert(path, Scalar::Number(n.clone())),
            Value::String(s) => flat.insert(path, Scalar::String(s.clone())),
        }
    }

    flat
}

/// Object lists become a count placeholder, everything else is joined with `|`.
fn collapse_list(items: &[Value]) -> String {
    if is_object_list(items) {
        return format!("[List of {} items]", items.len());
    }

    items
        .iter()
        .map(render_item)
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

fn render_item(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
