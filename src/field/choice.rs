use std::sync::Arc;

use serde_json::Value;

use super::{prepare_nested, FieldKind, FieldOptions, FieldSpec};
use crate::error::{Reason, ValidationError};

/// One value out of a fixed set, optionally prepared through a nested field.
#[derive(Debug, Clone)]
pub struct ChoiceField {
    options: FieldOptions,
    choices: Vec<Value>,
    inner: Option<Arc<dyn FieldSpec>>,
}

impl ChoiceField {
    pub fn new<I, V>(choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            options: FieldOptions::default(),
            choices: choices.into_iter().map(Into::into).collect(),
            inner: None,
        }
    }

    /// Prepare accepted values through `field` as well.
    pub fn of(mut self, field: impl FieldSpec + 'static) -> Self {
        self.inner = Some(Arc::new(field));
        self
    }

    pub fn choices(&self) -> &[Value] {
        &self.choices
    }
}

field_options!(ChoiceField);

impl FieldSpec for ChoiceField {
    fn kind(&self) -> FieldKind {
        FieldKind::Choice
    }

    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn check(&self) -> Result<(), String> {
        if self.choices.is_empty() {
            return Err("choice field needs at least one choice".into());
        }
        match &self.inner {
            Some(inner) => inner.check(),
            None => Ok(()),
        }
    }

    fn coerce(&self, value: Value) -> Result<Value, ValidationError> {
        let choice = self
            .choices
            .iter()
            .find(|choice| same_choice(choice, &value))
            .ok_or_else(|| ValidationError::new(Reason::NotInChoices))?;
        prepare_nested(self.inner.as_ref(), choice.clone())
    }
}

/// Numbers compare by value, so `1` and `1.0` name the same choice.
fn same_choice(choice: &Value, value: &Value) -> bool {
    match (choice, value) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => choice == value,
    }
}
