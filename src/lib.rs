//! Schema-driven object-document mapping.
//!
//! Declare a [`Schema`] of typed fields, computed properties, and methods;
//! register it with a [`Namespace`] to get a [`Model`]; create, validate,
//! save, and query [`Instance`]s through a pluggable [`Backend`].

mod error;
mod field;
mod model;
mod namespace;
mod schema;

pub mod backend;
pub mod fields;
pub mod validators;

use once_cell::sync::Lazy;

pub use backend::{Backend, MapFn, ReduceFn};
#[cfg(feature = "memory")]
pub use backend::{IdStrategy, MemoryBackend, MemoryBackendBuilder, MemoryConfig};
pub use error::{ModelError, Reason, ValidationError};
pub use field::{
    AutoIdField, AutoIncrementField, BinaryField, BooleanField, ChoiceField, DateField,
    DateTimeField, EmbeddedField, FieldDescriptor, FieldKind, FieldOptions, FieldSpec, FileField,
    FloatField, IntegerField, ListField, RefShape, ReferenceField, StringField, Validator,
};
pub use model::{FieldValue, Filter, Instance, Model, ID_FIELD};
pub use namespace::{Namespace, Registry};
pub use schema::{Getter, Method, Property, Schema, SchemaEntry, Setter};

/// A stored document: field name to prepared value, in field order.
pub type Document = serde_json::Map<String, serde_json::Value>;

static DEFAULT_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// The namespace called `name` in the process-wide default registry.
pub fn namespace(name: &str) -> Namespace {
    DEFAULT_REGISTRY.namespace(name)
}

/// The process-wide default registry.
pub fn registry() -> &'static Registry {
    &DEFAULT_REGISTRY
}
