//! Structural filters and partial updates over JSON documents.

use serde_json::Value;

use crate::Document;

/// True when every entry of `filter` matches the same entry of `document`.
///
/// Mappings match partially and recursively, a list matches when each of
/// its elements matches some element of the document's list, and anything
/// else compares by equality. The empty filter matches everything.
pub fn matches(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(name, expected)| match document.get(name) {
        Some(actual) => value_matches(actual, expected),
        None => expected.is_null(),
    })
}

fn value_matches(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Object(actual), Value::Object(expected)) => matches(actual, expected),
        (Value::Array(actual), Value::Array(expected)) => expected
            .iter()
            .all(|wanted| actual.iter().any(|item| value_matches(item, wanted))),
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => actual == expected,
    }
}

/// Overwrite the top-level entries of `document` named by `update`.
pub fn merge(document: &mut Document, update: &Document) {
    for (name, value) in update {
        document.insert(name.clone(), value.clone());
    }
}
