//! Shared helpers for the integration suites.

#![allow(dead_code)]


use omega_models::Document;
use serde_json::Value;

pub use mock_backend::{Call, MockBackend};

/// Unwrap a `json!` mapping into a document.
pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(document) => document,
        other => panic!("expected a mapping, got {}", other),
    }
}
