//! Models - schemas compiled against a namespace.
//!
//! A [`Model`] is the compiled, immutable form of a [`Schema`]: an ordered
//! accessor table of field descriptors, properties, and methods, plus the
//! list of key fields. Models are cheap to clone and are shared by every
//! [`Instance`] they create.
//!
//! ## Example
//!
//! ```ignore
//! use omega_models::{fields, namespace, Schema};
//!
//! let ns = namespace("app");
//! ns.define([(
//!     "User",
//!     Schema::new()
//!         .field("nick", fields::string().required().key())
//!         .field("age", fields::integer().min(13.0)),
//! )])?;
//!
//! let user = ns.model("User").unwrap();
//! let mut alice = user.create(json!({ "nick": "alice", "age": 30 }));
//! alice.save().await?;
//! let found = user.find_one("alice").await?;
//! ```

mod instance;
mod populate;
mod query;

use std::fmt;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::backend::Backend;
use crate::error::ModelError;
use crate::field::{AutoIdField, FieldDescriptor, FieldKind};
use crate::namespace::{Namespace, NamespaceInner};
use crate::schema::{Method, Property, Schema, SchemaEntry};

pub use instance::{FieldValue, Instance};
pub use query::Filter;

/// Name of the identifier field synthesized for models without key fields.
pub const ID_FIELD: &str = "$id";

/// A compiled schema attribute.
#[derive(Clone)]
pub(crate) enum Attribute {
    Field(FieldDescriptor),
    Property(Property),
    Method(Method),
}

struct ModelDef {
    name: String,
    attributes: IndexMap<String, Attribute>,
    keys: Vec<String>,
    namespace: Weak<NamespaceInner>,
}

/// A compiled model. Clone-friendly via Arc.
#[derive(Clone)]
pub struct Model {
    def: Arc<ModelDef>,
}

impl Model {
    pub(crate) fn compile(
        name: String,
        schema: Schema,
        namespace: Weak<NamespaceInner>,
    ) -> Result<Self, ModelError> {
        if name.is_empty() {
            return Err(ModelError::definition("model name must not be empty"));
        }

        let mut attributes = IndexMap::new();
        let mut keys = Vec::new();

        for (attribute, entry) in schema.into_entries() {
            if attribute.is_empty() {
                return Err(ModelError::definition(format!(
                    "model {} has an attribute with an empty name",
                    name
                )));
            }
            if attribute == ID_FIELD {
                return Err(ModelError::definition(format!(
                    "model {}: '{}' is reserved",
                    name, ID_FIELD
                )));
            }
            if attributes.contains_key(&attribute) {
                return Err(ModelError::definition(format!(
                    "model {} declares '{}' more than once",
                    name, attribute
                )));
            }

            let compiled = match entry {
                SchemaEntry::Field(spec) => {
                    spec.check().map_err(|msg| {
                        ModelError::definition(format!("{}.{}: {}", name, attribute, msg))
                    })?;
                    if spec.options().key {
                        keys.push(attribute.clone());
                    }
                    Attribute::Field(FieldDescriptor::new(attribute.clone(), spec))
                }
                SchemaEntry::Property(property) => Attribute::Property(property),
                SchemaEntry::Method(method) => Attribute::Method(method),
            };
            attributes.insert(attribute, compiled);
        }

        if keys.is_empty() {
            let id = FieldDescriptor::new(ID_FIELD, Arc::new(AutoIdField::new().key()));
            attributes.insert(ID_FIELD.to_string(), Attribute::Field(id));
            keys.push(ID_FIELD.to_string());
        }

        debug!(model = %name, keys = ?keys, "compiled model");

        Ok(Self {
            def: Arc::new(ModelDef {
                name,
                attributes,
                keys,
                namespace,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Key field names, in declaration order.
    pub fn keys(&self) -> &[String] {
        &self.def.keys
    }

    /// Field descriptors, in declaration order. Properties and methods are
    /// not fields.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.def.attributes.values().filter_map(|attribute| match attribute {
            Attribute::Field(field) => Some(field),
            _ => None,
        })
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        match self.def.attributes.get(name)? {
            Attribute::Field(field) => Some(field),
            _ => None,
        }
    }

    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.def
            .attributes
            .iter()
            .filter(|(_, attribute)| matches!(attribute, Attribute::Property(_)))
            .map(|(name, _)| name.as_str())
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.def
            .attributes
            .iter()
            .filter(|(_, attribute)| matches!(attribute, Attribute::Method(_)))
            .map(|(name, _)| name.as_str())
    }

    /// True when the model falls back to the synthesized `$id` key.
    pub fn has_implicit_key(&self) -> bool {
        self.def.keys.len() == 1
            && self.def.keys[0] == ID_FIELD
            && self
                .field(ID_FIELD)
                .map_or(false, |field| field.kind() == FieldKind::AutoId)
    }

    pub(crate) fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.def.attributes.get(name)
    }

    pub(crate) fn attributes(&self) -> impl Iterator<Item = (&String, &Attribute)> {
        self.def.attributes.iter()
    }

    /// The namespace this model was defined in.
    pub fn namespace(&self) -> Result<Namespace, ModelError> {
        self.def
            .namespace
            .upgrade()
            .map(Namespace::from_inner)
            .ok_or_else(|| ModelError::backend("resolve", self.name(), "namespace was dropped"))
    }

    /// Build an instance that stores through the namespace's shared backend.
    ///
    /// Unknown keys in `data` are dropped. Values are not validated until
    /// [`Instance::save`].
    pub fn create(&self, data: Value) -> Instance {
        Instance::new(self.clone(), data, None)
    }

    /// Build an instance that stores through `backend` instead of the
    /// namespace's shared backend.
    pub fn create_with_backend(&self, data: Value, backend: Arc<dyn Backend>) -> Instance {
        Instance::new(self.clone(), data, Some(backend))
    }

    pub fn ptr_eq(&self, other: &Model) -> bool {
        Arc::ptr_eq(&self.def, &other.def)
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<(&str, FieldKind)> = self
            .fields()
            .map(|field| (field.name(), field.kind()))
            .collect();
        f.debug_struct("Model")
            .field("name", &self.def.name)
            .field("keys", &self.def.keys)
            .field("fields", &fields)
            .field("properties", &self.properties().collect::<Vec<_>>())
            .field("methods", &self.methods().collect::<Vec<_>>())
            .finish()
    }
}
