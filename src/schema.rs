//! Schema declarations: the raw material a namespace compiles into models.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::ModelError;
use crate::field::FieldSpec;
use crate::model::Instance;

pub type Getter = Arc<dyn Fn(&Instance) -> Value + Send + Sync>;
pub type Setter = Arc<dyn Fn(&mut Instance, Value) + Send + Sync>;

/// A method callable on every instance of a model through [`Instance::call`].
pub type Method = Arc<dyn Fn(&mut Instance, &[Value]) -> Result<Value, ModelError> + Send + Sync>;

/// A computed attribute. Never validated and never persisted, but included
/// in [`Instance::to_json`].
///
/// Without custom accessors the property reads and writes the instance's
/// scratch store. A property with a getter and no setter ignores writes.
#[derive(Clone, Default)]
pub struct Property {
    getter: Option<Getter>,
    setter: Option<Setter>,
}

impl Property {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn getter<F>(mut self, getter: F) -> Self
    where
        F: Fn(&Instance) -> Value + Send + Sync + 'static,
    {
        self.getter = Some(Arc::new(getter));
        self
    }

    pub fn setter<F>(mut self, setter: F) -> Self
    where
        F: Fn(&mut Instance, Value) + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(setter));
        self
    }

    pub(crate) fn get(&self, name: &str, instance: &Instance) -> Value {
        match &self.getter {
            Some(getter) => getter(instance),
            None => instance.scratch(name).cloned().unwrap_or(Value::Null),
        }
    }

    /// Returns false when the write was ignored.
    pub(crate) fn set(&self, name: &str, instance: &mut Instance, value: Value) -> bool {
        match (&self.setter, &self.getter) {
            (Some(setter), _) => {
                setter(instance, value);
                true
            }
            (None, Some(_)) => false,
            (None, None) => {
                instance.set_scratch(name, value);
                true
            }
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .finish()
    }
}

/// One attribute of a schema.
#[derive(Clone)]
pub enum SchemaEntry {
    Field(Arc<dyn FieldSpec>),
    Property(Property),
    Method(Method),
}

impl fmt::Debug for SchemaEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaEntry::Field(spec) => f.debug_tuple("Field").field(spec).finish(),
            SchemaEntry::Property(property) => f.debug_tuple("Property").field(property).finish(),
            SchemaEntry::Method(_) => f.write_str("Method"),
        }
    }
}

/// An ordered declaration of fields, properties, and methods.
///
/// ```ignore
/// let user = Schema::new()
///     .field("nick", fields::string().required().key())
///     .field("email", fields::string().validators([validators::email()]))
///     .property("display", Property::new().getter(|user| user.get("nick").unwrap_or_default()))
///     .method("greet", |user, _args| Ok(json!(format!("hi {}", user.get("nick").unwrap_or_default()))));
/// ```
///
/// Declaration order is kept: it is the order of key fields in `$key`, of
/// keys in `to_json`, and of fields visited by `populate`.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entries: Vec<(String, SchemaEntry)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, field: impl FieldSpec + 'static) -> Self {
        self.entries
            .push((name.into(), SchemaEntry::Field(Arc::new(field))));
        self
    }

    pub fn property(mut self, name: impl Into<String>, property: Property) -> Self {
        self.entries
            .push((name.into(), SchemaEntry::Property(property)));
        self
    }

    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&mut Instance, &[Value]) -> Result<Value, ModelError> + Send + Sync + 'static,
    {
        self.entries
            .push((name.into(), SchemaEntry::Method(Arc::new(method))));
        self
    }

    pub fn entries(&self) -> &[(String, SchemaEntry)] {
        &self.entries
    }

    pub(crate) fn into_entries(self) -> Vec<(String, SchemaEntry)> {
        self.entries
    }
}
