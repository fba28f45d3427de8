//! Reference resolution: swapping foreign keys for instances and back.

use futures::future::{join_all, BoxFuture, FutureExt};
use serde_json::Value;
use tracing::{debug, warn};

use super::{FieldValue, Instance, Model};
use crate::error::ModelError;
use crate::field::RefShape;
use crate::Document;

/// A reference-bearing field: (field name, target model name, holds a list).
fn reference_fields(model: &Model) -> Vec<(String, String, bool)> {
    model
        .fields()
        .filter_map(|field| {
            let shape = field.reference()?;
            let many = matches!(shape, RefShape::Many(_));
            Some((field.name().to_string(), shape.model().to_string(), many))
        })
        .collect()
}

/// Identifies one stored document across models.
fn identity(model: &Model, key: &Document) -> String {
    format!("{}:{}", model.name(), Value::Object(key.clone()))
}

/// Resolve one element. Returns the element to store back, plus the error
/// that stopped it from resolving, if any.
///
/// `path` holds the documents being populated above this one. A resolved
/// instance already on it is kept but not descended into.
async fn resolve(
    target: Model,
    element: FieldValue,
    recursive: bool,
    path: Vec<String>,
) -> (FieldValue, Option<ModelError>) {
    let key = match element {
        FieldValue::Value(Value::Object(key)) if !key.is_empty() => key,
        other => return (other, None),
    };

    match target.find_one(key.clone()).await {
        Ok(Some(mut found)) => {
            let error = if !recursive {
                None
            } else if path.contains(&identity(&target, &found.key())) {
                debug!(model = %target.name(), key = ?key, "reference cycle, not descending");
                None
            } else {
                found.populate_within(true, path).await.err()
            };
            (FieldValue::from(found), error)
        }
        Ok(None) => {
            warn!(model = %target.name(), key = ?key, "referenced document not found");
            (FieldValue::Value(Value::Object(key)), None)
        }
        Err(err) => (FieldValue::Value(Value::Object(key)), Some(err)),
    }
}

impl Instance {
    /// Replace the keys held by reference fields with the instances they
    /// point at.
    ///
    /// Fields are visited in declaration order and the elements of one field
    /// are looked up concurrently. Keys that match nothing stay keys. On a
    /// failed lookup the field still records its resolved siblings, the
    /// error is returned, and later fields are left alone.
    ///
    /// A recursive populate does not descend into a document that is already
    /// being populated further up the chain, so reference cycles terminate
    /// with that document resolved but its own references left as keys.
    pub fn populate(&mut self, recursive: bool) -> BoxFuture<'_, Result<(), ModelError>> {
        self.populate_within(recursive, Vec::new())
    }

    fn populate_within(
        &mut self,
        recursive: bool,
        mut path: Vec<String>,
    ) -> BoxFuture<'_, Result<(), ModelError>> {
        async move {
            let refs = reference_fields(self.model());
            if refs.is_empty() {
                return Ok(());
            }

            let namespace = self.model().namespace()?;
            path.push(identity(self.model(), &self.key()));
            debug!(model = %self.model().name(), recursive, "populating references");

            for (name, target_name, many) in refs {
                let target = namespace.model(&target_name).ok_or_else(|| {
                    ModelError::definition(format!(
                        "{}.{} references undefined model {}",
                        self.model().name(),
                        name,
                        target_name
                    ))
                })?;

                let current = match self.values.get(&name) {
                    Some(current) => current.clone(),
                    None => continue,
                };
                let elements = match current {
                    FieldValue::List(items) => items,
                    FieldValue::Value(Value::Array(items)) if many => {
                        items.into_iter().map(FieldValue::Value).collect()
                    }
                    _ if many => continue,
                    single => vec![single],
                };

                let lookups = elements
                    .into_iter()
                    .map(|element| resolve(target.clone(), element, recursive, path.clone()));
                let mut first_error = None;
                let mut resolved = Vec::new();
                for (element, error) in join_all(lookups).await {
                    if first_error.is_none() {
                        first_error = error;
                    }
                    resolved.push(element);
                }

                let value = if many {
                    FieldValue::List(resolved)
                } else {
                    match resolved.pop() {
                        Some(single) => single,
                        None => continue,
                    }
                };
                self.values.insert(name, value);

                if let Some(err) = first_error {
                    return Err(err);
                }
            }

            Ok(())
        }
        .boxed()
    }

    /// Collapse resolved references back to their keys. Plain keys are left
    /// as they are.
    pub fn depopulate(&mut self) {
        for (name, _, _) in reference_fields(self.model()) {
            if let Some(value) = self.values.get_mut(&name) {
                *value = FieldValue::Value(value.to_value());
            }
        }
    }
}
