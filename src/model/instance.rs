//! Model instances: a frozen attribute shape over a mutable value store.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, trace};

use super::{Attribute, Model};
use crate::backend::Backend;
use crate::error::ModelError;
use crate::field::{FieldKind, RefShape};
use crate::Document;

/// The value held by one field of an instance.
///
/// Reference fields hold either key mappings or, once populated, resolved
/// instances. Everything else is a plain JSON value.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Value(Value),
    Instance(Box<Instance>),
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// The storable form: resolved instances collapse to their `$key`.
    pub fn to_value(&self) -> Value {
        match self {
            FieldValue::Value(value) => value.clone(),
            FieldValue::Instance(instance) => Value::Object(instance.key()),
            FieldValue::List(items) => Value::Array(items.iter().map(Self::to_value).collect()),
        }
    }

    /// The projected form: resolved instances render through their own `to_json`.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Value(value) => value.clone(),
            FieldValue::Instance(instance) => instance.to_json(),
            FieldValue::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            FieldValue::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            FieldValue::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Value(value)
    }
}

impl From<Instance> for FieldValue {
    fn from(instance: Instance) -> Self {
        FieldValue::Instance(Box::new(instance))
    }
}

impl From<Vec<Instance>> for FieldValue {
    fn from(instances: Vec<Instance>) -> Self {
        FieldValue::List(instances.into_iter().map(FieldValue::from).collect())
    }
}

/// A live record of a [`Model`].
///
/// The set of attributes is fixed by the model; writes to anything else fail
/// with [`ModelError::UnknownAttribute`].
#[derive(Clone)]
pub struct Instance {
    model: Model,
    pub(super) values: IndexMap<String, FieldValue>,
    scratch: HashMap<String, Value>,
    backend: Option<Arc<dyn Backend>>,
}

impl Instance {
    pub(super) fn new(model: Model, data: Value, backend: Option<Arc<dyn Backend>>) -> Self {
        let mut instance = Self {
            model: model.clone(),
            values: IndexMap::new(),
            scratch: HashMap::new(),
            backend,
        };

        let data = match data {
            Value::Object(data) => data,
            Value::Null => Document::new(),
            other => {
                trace!(model = %model.name(), value = %other, "ignoring non-mapping initial data");
                Document::new()
            }
        };

        for (name, value) in data {
            match model.attribute(&name) {
                Some(Attribute::Field(field)) => {
                    if field.kind() == FieldKind::AutoId && value.is_null() {
                        continue;
                    }
                    let value = match field.reference() {
                        Some(shape) => sanitize_reference(&model, shape, value),
                        None => value,
                    };
                    instance.values.insert(name, FieldValue::Value(value));
                }
                Some(Attribute::Property(property)) => {
                    property.set(&name, &mut instance, value);
                }
                Some(Attribute::Method(_)) | None => {
                    trace!(model = %model.name(), attribute = %name, "dropping unknown attribute");
                }
            }
        }

        instance
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// The projected value of a field or property. `None` for anything the
    /// model does not declare as one.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.model.attribute(name)? {
            Attribute::Field(_) => Some(
                self.values
                    .get(name)
                    .map(FieldValue::to_json)
                    .unwrap_or(Value::Null),
            ),
            Attribute::Property(property) => Some(property.get(name, self)),
            Attribute::Method(_) => None,
        }
    }

    /// The raw value of a field, if it has been set.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Assign a field or property.
    ///
    /// Writes to backend-assigned identifier fields and to getter-only
    /// properties are ignored.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), ModelError> {
        let value: FieldValue = value.into();
        let model = self.model.clone();
        match model.attribute(name) {
            Some(Attribute::Field(field)) if field.kind() == FieldKind::AutoId => {
                debug!(model = %model.name(), field = %name, "ignoring write to auto id field");
                Ok(())
            }
            Some(Attribute::Field(_)) => {
                self.values.insert(name.to_string(), value);
                Ok(())
            }
            Some(Attribute::Property(property)) => {
                if !property.set(name, self, value.to_json()) {
                    debug!(model = %model.name(), property = %name, "ignoring write to read-only property");
                }
                Ok(())
            }
            Some(Attribute::Method(_)) | None => Err(ModelError::UnknownAttribute {
                model: model.name().to_string(),
                attribute: name.to_string(),
            }),
        }
    }

    pub fn scratch(&self, name: &str) -> Option<&Value> {
        self.scratch.get(name)
    }

    /// Write to the scratch store that backs computed properties.
    pub fn set_scratch(&mut self, name: &str, value: Value) {
        self.scratch.insert(name.to_string(), value);
    }

    /// The `$key`: exactly the key fields, in declaration order. Unset key
    /// fields appear as `null`.
    pub fn key(&self) -> Document {
        self.model
            .keys()
            .iter()
            .map(|name| {
                let value = self
                    .values
                    .get(name)
                    .map(FieldValue::to_value)
                    .unwrap_or(Value::Null);
                (name.clone(), value)
            })
            .collect()
    }

    /// Set fields plus every computed property. Methods are not included.
    pub fn to_json(&self) -> Value {
        let mut projected = Document::new();
        for (name, attribute) in self.model.attributes() {
            match attribute {
                Attribute::Field(_) => {
                    if let Some(value) = self.values.get(name) {
                        projected.insert(name.clone(), value.to_json());
                    }
                }
                Attribute::Property(property) => {
                    projected.insert(name.clone(), property.get(name, self));
                }
                Attribute::Method(_) => {}
            }
        }
        Value::Object(projected)
    }

    /// Invoke a declared method with this instance as the receiver.
    pub fn call(&mut self, method: &str, args: &[Value]) -> Result<Value, ModelError> {
        let model = self.model.clone();
        match model.attribute(method) {
            Some(Attribute::Method(method)) => method(self, args),
            _ => Err(ModelError::UnknownAttribute {
                model: model.name().to_string(),
                attribute: method.to_string(),
            }),
        }
    }

    /// The document `save` would hand to the backend.
    ///
    /// Every field except auto ids is prepared; absent optional fields are
    /// left out.
    pub fn prepare(&self) -> Result<Document, ModelError> {
        let mut prepared = Document::new();
        for field in self.model.fields() {
            if field.kind() == FieldKind::AutoId {
                continue;
            }
            let raw = self.values.get(field.name()).map(FieldValue::to_value);
            if let Some(value) = field.prepare(raw)? {
                prepared.insert(field.name().to_string(), value);
            }
        }
        Ok(prepared)
    }

    /// The backend this instance stores through.
    pub fn backend(&self) -> Result<Arc<dyn Backend>, ModelError> {
        match &self.backend {
            Some(backend) => Ok(Arc::clone(backend)),
            None => self.model.shared_backend(),
        }
    }

    /// Validate and store. On a validation error nothing is sent to the
    /// backend and the instance is left as it was.
    pub async fn save(&mut self) -> Result<(), ModelError> {
        let backend = self.backend()?;
        let prepared = self.prepare()?;

        debug!(model = %self.model.name(), fields = prepared.len(), "saving instance");
        if let Some(stored) = backend.store(self, prepared).await? {
            self.merge(stored);
        }
        Ok(())
    }

    /// Remove the stored document with this instance's `$key`.
    pub async fn remove(&self) -> Result<(), ModelError> {
        let backend = self.backend()?;
        let key = self.key();

        debug!(model = %self.model.name(), key = ?key, "removing instance");
        backend.remove(&self.model, &key).await
    }

    fn merge(&mut self, stored: Document) {
        for (name, value) in stored {
            if matches!(self.model.attribute(&name), Some(Attribute::Field(_))) {
                self.values.insert(name, FieldValue::Value(value));
            }
        }
    }
}

/// Reduce a reference value read from data to the target's key fields, when
/// the target model can be resolved.
fn sanitize_reference(model: &Model, shape: RefShape<'_>, value: Value) -> Value {
    let target = match model
        .namespace()
        .ok()
        .and_then(|ns| ns.model(shape.model()))
    {
        Some(target) => target,
        None => return value,
    };

    match (shape, value) {
        (RefShape::One(_), value) => key_of(&target, value),
        (RefShape::Many(_), Value::Array(items)) => Value::Array(
            items
                .into_iter()
                .map(|item| key_of(&target, item))
                .collect(),
        ),
        (RefShape::Many(_), value) => value,
    }
}

fn key_of(target: &Model, value: Value) -> Value {
    match value {
        Value::Object(mut document) => Value::Object(
            target
                .keys()
                .iter()
                .filter_map(|key| document.remove(key).map(|v| (key.clone(), v)))
                .filter(|(_, v)| !v.is_null())
                .collect(),
        ),
        other => other,
    }
}

impl Serialize for Instance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("model", &self.model.name())
            .field("values", &self.values)
            .field("scratch", &self.scratch)
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .finish()
    }
}
