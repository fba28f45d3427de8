//! Field descriptors - the unit of the schema type system.
//!
//! Every field kind implements [`FieldSpec`]. The trait supplies the shared
//! preparation pipeline (default substitution, the `required` check, and the
//! validators) and each kind overrides only its coercion step. Kind-specific
//! options live on the kind's own struct, so options that make no sense for a
//! kind cannot be set on it.
//!
//! ```ignore
//! use omega_models::fields;
//!
//! let nick = fields::string().required().max_length(32);
//! let age = fields::integer().min(13.0).max(45.0);
//! let friends = fields::ref_list("User");
//! ```

/// Builder methods for the options every kind shares.
macro_rules! field_options {
    ($ty:ty) => {
        impl $ty {
            /// Fail preparation when the value is absent or falsy and there is no default.
            pub fn required(mut self) -> Self {
                self.options.required = true;
                self
            }

            /// Value substituted when the field is absent.
            pub fn default_value(mut self, value: impl Into<serde_json::Value>) -> Self {
                self.options.default = Some(value.into());
                self
            }

            /// Mark this field as (part of) the model's key.
            pub fn key(mut self) -> Self {
                self.options.key = true;
                self
            }

            pub fn validator<F>(mut self, validator: F) -> Self
            where
                F: Fn(&serde_json::Value) -> Result<(), String> + Send + Sync + 'static,
            {
                self.options.validators.push(std::sync::Arc::new(validator));
                self
            }

            pub fn validators(
                mut self,
                validators: impl IntoIterator<Item = $crate::field::Validator>,
            ) -> Self {
                self.options.validators.extend(validators);
                self
            }

            pub fn help(mut self, text: impl Into<String>) -> Self {
                self.options.help = Some(text.into());
                self
            }
        }
    };
}

mod auto;
mod choice;
mod list;
mod reference;
mod scalar;
mod temporal;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Reason, ValidationError};

pub use auto::{AutoIdField, AutoIncrementField};
pub use choice::ChoiceField;
pub use list::ListField;
pub use reference::ReferenceField;
pub use scalar::{
    BinaryField, BooleanField, EmbeddedField, FileField, FloatField, IntegerField, StringField,
};
pub use temporal::{DateField, DateTimeField};

/// Tag identifying a field's semantic type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    AutoId,
    AutoIncrement,
    Binary,
    Boolean,
    String,
    Text,
    Choice,
    Date,
    DateTime,
    Embedded,
    File,
    Float,
    Integer,
    List,
    Reference,
    RefList,
    Property,
}

impl FieldKind {
    /// Kinds whose values are assigned by the backend.
    pub fn is_auto(&self) -> bool {
        matches!(self, FieldKind::AutoId | FieldKind::AutoIncrement)
    }
}

/// A field validator. Returns `Err` with a message to reject the value; an
/// empty message is reported as a generic rejection.
pub type Validator = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Options shared by every field kind.
#[derive(Clone, Default)]
pub struct FieldOptions {
    pub required: bool,
    pub default: Option<Value>,
    pub key: bool,
    pub validators: Vec<Validator>,
    pub help: Option<String>,
}

impl fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOptions")
            .field("required", &self.required)
            .field("default", &self.default)
            .field("key", &self.key)
            .field("validators", &self.validators.len())
            .field("help", &self.help)
            .finish()
    }
}

/// The target of a reference-bearing field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefShape<'a> {
    /// A single foreign key into the named model.
    One(&'a str),
    /// A list of foreign keys into the named model.
    Many(&'a str),
}

impl<'a> RefShape<'a> {
    pub fn model(&self) -> &'a str {
        match self {
            RefShape::One(model) | RefShape::Many(model) => model,
        }
    }
}

/// Behaviour common to every field kind.
pub trait FieldSpec: fmt::Debug + Send + Sync {
    fn kind(&self) -> FieldKind;

    fn options(&self) -> &FieldOptions;

    /// Kind-specific coercion of a present value.
    fn coerce(&self, value: Value) -> Result<Value, ValidationError> {
        Ok(value)
    }

    /// The prepared value of an absent, non-defaulted field.
    fn absent(&self) -> Option<Value> {
        None
    }

    /// Compile-time sanity checks on the kind's options.
    fn check(&self) -> Result<(), String> {
        Ok(())
    }

    fn reference(&self) -> Option<RefShape<'_>> {
        None
    }

    /// Validate and coerce a raw value. `None` and `null` both mean absent.
    ///
    /// Returns `Ok(None)` when the field should be left out of the stored
    /// document.
    fn prepare(&self, value: Option<Value>) -> Result<Option<Value>, ValidationError> {
        let options = self.options();
        let value = match value {
            None | Some(Value::Null) => options.default.clone(),
            present => present,
        };

        if options.required && options.default.is_none() && value.as_ref().map_or(true, is_falsy)
        {
            return Err(ValidationError::new(Reason::Required));
        }

        let probe = value.clone().unwrap_or(Value::Null);
        for validator in &options.validators {
            if let Err(message) = (**validator)(&probe) {
                let message = if message.is_empty() {
                    "rejected by validator".to_string()
                } else {
                    message
                };
                return Err(ValidationError::new(Reason::Rejected(message)));
            }
        }

        match value {
            Some(value) => self.coerce(value).map(Some),
            None => Ok(self.absent()),
        }
    }
}

/// A field descriptor bound to its attribute name at schema-compile time.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: String,
    spec: Arc<dyn FieldSpec>,
}

impl FieldDescriptor {
    pub(crate) fn new(name: impl Into<String>, spec: Arc<dyn FieldSpec>) -> Self {
        Self {
            name: name.into(),
            spec,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.spec.kind()
    }

    pub fn spec(&self) -> &dyn FieldSpec {
        self.spec.as_ref()
    }

    pub fn is_key(&self) -> bool {
        self.spec.options().key
    }

    pub fn reference(&self) -> Option<RefShape<'_>> {
        self.spec.reference()
    }

    /// Prepare a value for storage, naming this field in any error.
    pub fn prepare(&self, value: Option<Value>) -> Result<Option<Value>, ValidationError> {
        self.spec
            .prepare(value)
            .map_err(|err| err.in_field(&self.name))
    }
}

/// JavaScript-style falsiness, used by the `required` check.
pub(crate) fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |n| n == 0.0 || n.is_nan()),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Prepare a value through an optional nested field; absent results become `null`.
pub(crate) fn prepare_nested(
    inner: Option<&Arc<dyn FieldSpec>>,
    value: Value,
) -> Result<Value, ValidationError> {
    match inner {
        Some(inner) => Ok(inner.prepare(Some(value))?.unwrap_or(Value::Null)),
        None => Ok(value),
    }
}
