//! Backend-assigned fields.

use serde_json::Value;

use super::{FieldKind, FieldOptions, FieldSpec};
use crate::error::ValidationError;

/// An identifier generated by the backend on first store.
///
/// Preparation discards any value: the backend alone decides what gets
/// stored, reusing the identifier it assigned earlier when the instance
/// already carries one.
#[derive(Debug, Clone, Default)]
pub struct AutoIdField {
    options: FieldOptions,
}

impl AutoIdField {
    pub fn new() -> Self {
        Self::default()
    }
}

field_options!(AutoIdField);

impl FieldSpec for AutoIdField {
    fn kind(&self) -> FieldKind {
        FieldKind::AutoId
    }

    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn prepare(&self, _value: Option<Value>) -> Result<Option<Value>, ValidationError> {
        Ok(None)
    }
}

/// A per-collection counter, filled in by the backend when absent.
#[derive(Debug, Clone, Default)]
pub struct AutoIncrementField {
    options: FieldOptions,
}

impl AutoIncrementField {
    pub fn new() -> Self {
        Self::default()
    }
}

field_options!(AutoIncrementField);

impl FieldSpec for AutoIncrementField {
    fn kind(&self) -> FieldKind {
        FieldKind::AutoIncrement
    }

    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn prepare(&self, value: Option<Value>) -> Result<Option<Value>, ValidationError> {
        Ok(value.filter(|v| !v.is_null()))
    }
}
