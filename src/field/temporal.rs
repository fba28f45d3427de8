//! Calendar dates and timestamps.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::Value;

use super::{FieldKind, FieldOptions, FieldSpec};
use crate::error::ValidationError;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn from_millis(value: &Value) -> Option<DateTime<Utc>> {
    value.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis)
}

fn invalid(expected: &str, value: &Value) -> ValidationError {
    ValidationError::coercion(format!("expected {}, got {}", expected, value))
}

/// A calendar date, stored as `YYYY-MM-DD`.
#[derive(Debug, Clone, Default)]
pub struct DateField {
    options: FieldOptions,
}

impl DateField {
    pub fn new() -> Self {
        Self::default()
    }
}

field_options!(DateField);

impl FieldSpec for DateField {
    fn kind(&self) -> FieldKind {
        FieldKind::Date
    }

    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn coerce(&self, value: Value) -> Result<Value, ValidationError> {
        let date = match &value {
            Value::String(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
                .ok()
                .or_else(|| {
                    DateTime::parse_from_rfc3339(s.trim())
                        .ok()
                        .map(|dt| dt.with_timezone(&Utc).date_naive())
                }),
            Value::Number(_) => from_millis(&value).map(|dt| dt.date_naive()),
            _ => None,
        };

        date.map(|d| Value::String(d.format(DATE_FORMAT).to_string()))
            .ok_or_else(|| invalid("a date", &value))
    }
}

/// A point in time, stored as an RFC 3339 UTC timestamp with millisecond
/// precision.
#[derive(Debug, Clone, Default)]
pub struct DateTimeField {
    options: FieldOptions,
}

impl DateTimeField {
    pub fn new() -> Self {
        Self::default()
    }
}

field_options!(DateTimeField);

impl FieldSpec for DateTimeField {
    fn kind(&self) -> FieldKind {
        FieldKind::DateTime
    }

    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn coerce(&self, value: Value) -> Result<Value, ValidationError> {
        let timestamp = match &value {
            Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Value::Number(_) => from_millis(&value),
            _ => None,
        };

        timestamp
            .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)))
            .ok_or_else(|| invalid("a timestamp", &value))
    }
}
