//! Constructors for every field kind, for use in schema declarations.
//!
//! ```ignore
//! use omega_models::{fields, Schema};
//!
//! let schema = Schema::new()
//!     .field("nick", fields::string().required().key())
//!     .field("age", fields::integer().min(13.0))
//!     .field("friends", fields::ref_list("User"));
//! ```

use serde_json::Value;

use crate::field::{
    AutoIdField, AutoIncrementField, BinaryField, BooleanField, ChoiceField, DateField,
    DateTimeField, EmbeddedField, FileField, FloatField, IntegerField, ListField, ReferenceField,
    StringField,
};

pub fn auto_id() -> AutoIdField {
    AutoIdField::new()
}

pub fn auto_increment() -> AutoIncrementField {
    AutoIncrementField::new()
}

pub fn binary() -> BinaryField {
    BinaryField::new()
}

pub fn boolean() -> BooleanField {
    BooleanField::new()
}

pub fn string() -> StringField {
    StringField::new()
}

/// An unbounded string.
pub fn text() -> StringField {
    StringField::text()
}

pub fn choice<I, V>(choices: I) -> ChoiceField
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    ChoiceField::new(choices)
}

pub fn date() -> DateField {
    DateField::new()
}

pub fn datetime() -> DateTimeField {
    DateTimeField::new()
}

pub fn embedded() -> EmbeddedField {
    EmbeddedField::new()
}

pub fn file() -> FileField {
    FileField::new()
}

pub fn float() -> FloatField {
    FloatField::new()
}

pub fn integer() -> IntegerField {
    IntegerField::new()
}

pub fn list() -> ListField {
    ListField::new()
}

/// A foreign key into `model`, resolved by name against the owning namespace.
pub fn reference(model: impl Into<String>) -> ReferenceField {
    ReferenceField::new(model)
}

/// A list of foreign keys into `model`.
pub fn ref_list(model: impl Into<String>) -> ListField {
    ListField::references(model)
}
