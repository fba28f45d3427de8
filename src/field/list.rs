use std::sync::Arc;

use serde_json::Value;

use super::{prepare_nested, FieldKind, FieldOptions, FieldSpec, RefShape, ReferenceField};
use crate::error::ValidationError;

/// A homogeneous list. Absent lists prepare to `[]`.
#[derive(Debug, Clone)]
pub struct ListField {
    options: FieldOptions,
    inner: Option<Arc<dyn FieldSpec>>,
    kind: FieldKind,
}

impl Default for ListField {
    fn default() -> Self {
        Self::new()
    }
}

impl ListField {
    pub fn new() -> Self {
        Self {
            options: FieldOptions::default(),
            inner: None,
            kind: FieldKind::List,
        }
    }

    /// A list of references into `model`.
    pub fn references(model: impl Into<String>) -> Self {
        Self {
            kind: FieldKind::RefList,
            ..Self::new().of(ReferenceField::new(model))
        }
    }

    /// Prepare every element through `field`.
    pub fn of(mut self, field: impl FieldSpec + 'static) -> Self {
        self.inner = Some(Arc::new(field));
        self
    }
}

field_options!(ListField);

impl FieldSpec for ListField {
    fn kind(&self) -> FieldKind {
        self.kind
    }

    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn absent(&self) -> Option<Value> {
        Some(Value::Array(Vec::new()))
    }

    fn check(&self) -> Result<(), String> {
        match &self.inner {
            Some(inner) if inner.kind().is_auto() => {
                Err("lists cannot hold backend-assigned fields".into())
            }
            Some(inner) => inner.check(),
            None => Ok(()),
        }
    }

    fn reference(&self) -> Option<RefShape<'_>> {
        match self.inner.as_ref()?.reference()? {
            RefShape::One(model) => Some(RefShape::Many(model)),
            RefShape::Many(_) => None,
        }
    }

    fn coerce(&self, value: Value) -> Result<Value, ValidationError> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(ValidationError::coercion(format!(
                    "expected a list, got {}",
                    other
                )))
            }
        };

        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                prepare_nested(self.inner.as_ref(), item)
                    .map_err(|err| err.in_field(&index.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }
}
