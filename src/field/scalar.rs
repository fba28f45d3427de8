//! Scalar field kinds: booleans, strings, numbers, binary blobs, files, and
//! embedded mappings.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Number, Value};

use super::{FieldKind, FieldOptions, FieldSpec};
use crate::error::{Reason, ValidationError};

const FALSE_WORDS: [&str; 5] = ["false", "f", "0", "no", "unchecked"];

/// `true`/`false`, parsed leniently from form-style input.
#[derive(Debug, Clone, Default)]
pub struct BooleanField {
    options: FieldOptions,
}

impl BooleanField {
    pub fn new() -> Self {
        Self::default()
    }
}

field_options!(BooleanField);

impl FieldSpec for BooleanField {
    fn kind(&self) -> FieldKind {
        FieldKind::Boolean
    }

    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn coerce(&self, value: Value) -> Result<Value, ValidationError> {
        let text = match &value {
            Value::Bool(b) => b.to_string(),
            Value::String(s) => s.to_lowercase(),
            Value::Number(n) if n.as_f64() == Some(0.0) => "0".to_string(),
            Value::Number(n) => n.to_string(),
            _ => return Ok(Value::Bool(true)),
        };
        Ok(Value::Bool(!FALSE_WORDS.contains(&text.as_str())))
    }
}

/// A string, optionally bounded by `max_length` characters.
#[derive(Debug, Clone)]
pub struct StringField {
    options: FieldOptions,
    max_length: Option<usize>,
    kind: FieldKind,
}

impl Default for StringField {
    fn default() -> Self {
        Self::new()
    }
}

impl StringField {
    pub fn new() -> Self {
        Self {
            options: FieldOptions::default(),
            max_length: None,
            kind: FieldKind::String,
        }
    }

    /// A long-form string. Prepares exactly like a string field.
    pub fn text() -> Self {
        Self {
            kind: FieldKind::Text,
            ..Self::new()
        }
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }
}

field_options!(StringField);

impl FieldSpec for StringField {
    fn kind(&self) -> FieldKind {
        self.kind
    }

    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn coerce(&self, value: Value) -> Result<Value, ValidationError> {
        let text = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => {
                return Err(ValidationError::coercion(format!(
                    "expected a string, got {}",
                    other
                )))
            }
        };

        if let Some(max_length) = self.max_length {
            let length = text.chars().count();
            if length > max_length {
                return Err(ValidationError::new(Reason::TooLong { length, max_length }));
            }
        }

        Ok(Value::String(text))
    }
}

/// Parse a number the way form input usually arrives: as a JSON number or a
/// numeric string.
fn to_number(value: &Value) -> Result<f64, ValidationError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(ValidationError::coercion(format!(
            "expected a number, got {}",
            value
        ))),
    }
}

/// Bounds are only enforced when set to a non-zero number, so `min(0.0)` and
/// `max(0.0)` behave as if no bound was configured.
fn active(bound: Option<f64>) -> Option<f64> {
    bound.filter(|b| *b != 0.0 && !b.is_nan())
}

fn check_range(value: f64, min: Option<f64>, max: Option<f64>) -> Result<(), ValidationError> {
    let (min, max) = (active(min), active(max));
    let below = min.map_or(false, |min| value < min);
    let above = max.map_or(false, |max| value > max);
    if below || above {
        return Err(ValidationError::new(Reason::OutOfRange { value, min, max }));
    }
    Ok(())
}

fn check_bounds(min: Option<f64>, max: Option<f64>) -> Result<(), String> {
    match (active(min), active(max)) {
        (Some(min), Some(max)) if min > max => {
            Err(format!("min ({}) is greater than max ({})", min, max))
        }
        _ => Ok(()),
    }
}

/// A whole number. Fractional input is truncated toward zero.
#[derive(Debug, Clone, Default)]
pub struct IntegerField {
    options: FieldOptions,
    min: Option<f64>,
    max: Option<f64>,
}

impl IntegerField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive lower bound. A bound of `0` is not enforced.
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Inclusive upper bound. A bound of `0` is not enforced.
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }
}

field_options!(IntegerField);

impl FieldSpec for IntegerField {
    fn kind(&self) -> FieldKind {
        FieldKind::Integer
    }

    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn check(&self) -> Result<(), String> {
        check_bounds(self.min, self.max)
    }

    fn coerce(&self, value: Value) -> Result<Value, ValidationError> {
        let n = to_number(&value)?.trunc();
        if n < i64::MIN as f64 || n >= i64::MAX as f64 {
            return Err(ValidationError::coercion(format!(
                "{} does not fit in a 64-bit integer",
                value
            )));
        }
        check_range(n, self.min, self.max)?;
        Ok(Value::from(n as i64))
    }
}

/// A floating point number.
#[derive(Debug, Clone, Default)]
pub struct FloatField {
    options: FieldOptions,
    min: Option<f64>,
    max: Option<f64>,
}

impl FloatField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive lower bound. A bound of `0` is not enforced.
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Inclusive upper bound. A bound of `0` is not enforced.
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }
}

field_options!(FloatField);

impl FieldSpec for FloatField {
    fn kind(&self) -> FieldKind {
        FieldKind::Float
    }

    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn check(&self) -> Result<(), String> {
        check_bounds(self.min, self.max)
    }

    fn coerce(&self, value: Value) -> Result<Value, ValidationError> {
        let n = to_number(&value)?;
        check_range(n, self.min, self.max)?;
        Number::from_f64(n)
            .map(Value::Number)
            .ok_or_else(|| ValidationError::coercion(format!("{} is not representable", n)))
    }
}

/// Binary data, stored as standard base64. Accepts a base64 string or a list
/// of byte values.
#[derive(Debug, Clone, Default)]
pub struct BinaryField {
    options: FieldOptions,
}

impl BinaryField {
    pub fn new() -> Self {
        Self::default()
    }
}

field_options!(BinaryField);

impl FieldSpec for BinaryField {
    fn kind(&self) -> FieldKind {
        FieldKind::Binary
    }

    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn coerce(&self, value: Value) -> Result<Value, ValidationError> {
        match value {
            Value::String(encoded) => {
                STANDARD
                    .decode(encoded.as_bytes())
                    .map_err(|e| ValidationError::coercion(format!("invalid base64: {}", e)))?;
                Ok(Value::String(encoded))
            }
            Value::Array(items) => {
                let bytes = items
                    .iter()
                    .map(|item| {
                        item.as_u64()
                            .and_then(|b| u8::try_from(b).ok())
                            .ok_or_else(|| {
                                ValidationError::coercion(format!("{} is not a byte", item))
                            })
                    })
                    .collect::<Result<Vec<u8>, _>>()?;
                Ok(Value::String(STANDARD.encode(bytes)))
            }
            other => Err(ValidationError::coercion(format!(
                "expected base64 text or a byte list, got {}",
                other
            ))),
        }
    }
}

/// A reference to a file by path or URL.
#[derive(Debug, Clone, Default)]
pub struct FileField {
    options: FieldOptions,
}

impl FileField {
    pub fn new() -> Self {
        Self::default()
    }
}

field_options!(FileField);

impl FieldSpec for FileField {
    fn kind(&self) -> FieldKind {
        FieldKind::File
    }

    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn coerce(&self, value: Value) -> Result<Value, ValidationError> {
        match value {
            Value::String(path) => Ok(Value::String(path)),
            other => Err(ValidationError::coercion(format!(
                "expected a file path, got {}",
                other
            ))),
        }
    }
}

/// A nested mapping stored inline in the document.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedField {
    options: FieldOptions,
}

impl EmbeddedField {
    pub fn new() -> Self {
        Self::default()
    }
}

field_options!(EmbeddedField);

impl FieldSpec for EmbeddedField {
    fn kind(&self) -> FieldKind {
        FieldKind::Embedded
    }

    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn coerce(&self, value: Value) -> Result<Value, ValidationError> {
        match value {
            Value::Object(map) => Ok(Value::Object(map)),
            other => Err(ValidationError::coercion(format!(
                "expected a mapping, got {}",
                other
            ))),
        }
    }
}
