use serde_json::Value;

use super::{FieldKind, FieldOptions, FieldSpec, RefShape};
use crate::error::ValidationError;
use crate::Document;

/// A foreign key into another model of the same namespace.
///
/// The target model is named, not held, so models may reference each other
/// before both are defined. A resolved instance assigned to the field is
/// collapsed to its `$key` before it reaches [`FieldSpec::prepare`], so the
/// prepared value is always a key mapping.
#[derive(Debug, Clone)]
pub struct ReferenceField {
    options: FieldOptions,
    model: String,
    filter: Option<Document>,
}

impl ReferenceField {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            options: FieldOptions::default(),
            model: model.into(),
            filter: None,
        }
    }

    /// Describe the documents this field is meant to point at. Informational
    /// only; preparation does not enforce it.
    pub fn filter(mut self, filter: Document) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn target_filter(&self) -> Option<&Document> {
        self.filter.as_ref()
    }
}

field_options!(ReferenceField);

impl FieldSpec for ReferenceField {
    fn kind(&self) -> FieldKind {
        FieldKind::Reference
    }

    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn check(&self) -> Result<(), String> {
        if self.model.is_empty() {
            return Err("reference field needs a target model".into());
        }
        Ok(())
    }

    fn reference(&self) -> Option<RefShape<'_>> {
        Some(RefShape::One(&self.model))
    }

    fn coerce(&self, value: Value) -> Result<Value, ValidationError> {
        match value {
            Value::Object(key) => Ok(Value::Object(key)),
            other => Err(ValidationError::coercion(format!(
                "expected a key mapping for {}, got {}",
                self.model, other
            ))),
        }
    }
}
