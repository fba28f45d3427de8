//! Error types shared by fields, models, namespaces, and backends.

use std::fmt;

/// Why a single field failed to prepare.
#[derive(Debug, Clone, PartialEq)]
pub enum Reason {
    /// The field is required, has no default, and the value was absent or falsy.
    Required,
    /// The value could not be coerced into the field's kind.
    Coercion(String),
    /// A numeric value fell outside the configured bounds.
    OutOfRange { value: f64, min: Option<f64>, max: Option<f64> },
    /// A string was longer than `max_length`.
    TooLong { length: usize, max_length: usize },
    /// The value is not one of the configured choices.
    NotInChoices,
    /// A validator rejected the value.
    Rejected(String),
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::Required => write!(f, "value is required"),
            Reason::Coercion(msg) => write!(f, "{}", msg),
            Reason::OutOfRange { value, min, max } => match (min, max) {
                (Some(min), Some(max)) => {
                    write!(f, "{} is outside the range {}..={}", value, min, max)
                }
                (Some(min), None) => write!(f, "{} is less than {}", value, min),
                (None, Some(max)) => write!(f, "{} is greater than {}", value, max),
                (None, None) => write!(f, "{} is out of range", value),
            },
            Reason::TooLong { length, max_length } => write!(
                f,
                "length {} exceeds the maximum of {}",
                length, max_length
            ),
            Reason::NotInChoices => write!(f, "value is not one of the allowed choices"),
            Reason::Rejected(msg) => write!(f, "{}", msg),
        }
    }
}

/// A field preparation failure, tagged with the field it happened on.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub reason: Reason,
}

impl ValidationError {
    pub fn new(reason: Reason) -> Self {
        Self {
            field: String::new(),
            reason,
        }
    }

    pub fn coercion(message: impl Into<String>) -> Self {
        Self::new(Reason::Coercion(message.into()))
    }

    /// Attach the field name. Nested fields (list elements, choice types) are
    /// reported as `outer.inner`.
    pub fn in_field(mut self, name: &str) -> Self {
        self.field = if self.field.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", name, self.field)
        };
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "validation failed: {}", self.reason)
        } else {
            write!(f, "validation failed for '{}': {}", self.field, self.reason)
        }
    }
}

impl std::error::Error for ValidationError {}

/// Error type for every fallible operation in the crate.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A field failed to prepare.
    Validation(ValidationError),
    /// A schema was malformed or a model name was reused.
    Definition(String),
    /// The backend does not support the requested operation.
    NotImplemented {
        operation: &'static str,
        backend: String,
    },
    /// An opaque failure inside a backend adapter.
    Backend {
        operation: &'static str,
        model: String,
        message: String,
    },
    /// An attribute that the model does not declare.
    UnknownAttribute { model: String, attribute: String },
}

impl ModelError {
    pub fn backend(
        operation: &'static str,
        model: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ModelError::Backend {
            operation,
            model: model.into(),
            message: message.into(),
        }
    }

    pub fn definition(message: impl Into<String>) -> Self {
        ModelError::Definition(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ModelError::Validation(_))
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Validation(err) => write!(f, "{}", err),
            ModelError::Definition(msg) => write!(f, "definition error: {}", msg),
            ModelError::NotImplemented { operation, backend } => {
                write!(f, "{} is not implemented by the {} backend", operation, backend)
            }
            ModelError::Backend {
                operation,
                model,
                message,
            } => write!(f, "backend error during {} on {}: {}", operation, model, message),
            ModelError::UnknownAttribute { model, attribute } => {
                write!(f, "model {} has no attribute '{}'", model, attribute)
            }
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ModelError {
    fn from(err: ValidationError) -> Self {
        ModelError::Validation(err)
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::backend("serde", "", err.to_string())
    }
}
