//! The static query surface of a model, delegated to the namespace's backend.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::{Instance, Model};
use crate::backend::Backend;
use crate::error::ModelError;
use crate::Document;

/// A query filter.
///
/// A bare scalar is shorthand for equality on the model's sole key field,
/// or on `id` when the key has several parts.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Document(Document),
    Scalar(Value),
}

impl Filter {
    /// The filter that matches every document.
    pub fn all() -> Self {
        Filter::Document(Document::new())
    }

    pub(crate) fn into_document(self, keys: &[String]) -> Document {
        match self {
            Filter::Document(document) => document,
            Filter::Scalar(value) => {
                let field = match keys {
                    [only] => only.clone(),
                    _ => "id".to_string(),
                };
                let mut document = Document::new();
                document.insert(field, value);
                document
            }
        }
    }
}

impl From<Document> for Filter {
    fn from(document: Document) -> Self {
        Filter::Document(document)
    }
}

impl From<Value> for Filter {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(document) => Filter::Document(document),
            other => Filter::Scalar(other),
        }
    }
}

impl From<&str> for Filter {
    fn from(value: &str) -> Self {
        Filter::Scalar(Value::from(value))
    }
}

impl From<String> for Filter {
    fn from(value: String) -> Self {
        Filter::Scalar(Value::from(value))
    }
}

impl From<i64> for Filter {
    fn from(value: i64) -> Self {
        Filter::Scalar(Value::from(value))
    }
}

impl Model {
    /// The backend shared by every model of the namespace.
    pub fn shared_backend(&self) -> Result<Arc<dyn Backend>, ModelError> {
        self.namespace()?
            .shared_backend()
            .ok_or_else(|| ModelError::backend("resolve", self.name(), "no backend configured"))
    }

    fn filter(&self, filter: impl Into<Filter>) -> Document {
        filter.into().into_document(self.keys())
    }

    fn instance(&self, document: Document) -> Instance {
        self.create(Value::Object(document))
    }

    pub async fn find(&self, filter: impl Into<Filter>) -> Result<Vec<Instance>, ModelError> {
        let backend = self.shared_backend()?;
        let filter = self.filter(filter);

        debug!(model = %self.name(), filter = ?filter, "find");
        let found = backend.find(self, &filter).await?;
        Ok(found.into_iter().map(|doc| self.instance(doc)).collect())
    }

    pub async fn find_all(&self) -> Result<Vec<Instance>, ModelError> {
        self.find(Filter::all()).await
    }

    pub async fn find_one(&self, filter: impl Into<Filter>) -> Result<Option<Instance>, ModelError> {
        let backend = self.shared_backend()?;
        let filter = self.filter(filter);

        debug!(model = %self.name(), filter = ?filter, "find_one");
        let found = backend.find_one(self, &filter).await?;
        Ok(found.map(|doc| self.instance(doc)))
    }

    /// Merge `update` onto one matching document and return the result.
    pub async fn find_one_and_update(
        &self,
        filter: impl Into<Filter>,
        update: Document,
    ) -> Result<Option<Instance>, ModelError> {
        let backend = self.shared_backend()?;
        let filter = self.filter(filter);

        debug!(model = %self.name(), filter = ?filter, "find_one_and_update");
        let updated = backend.find_one_and_update(self, &filter, &update).await?;
        Ok(updated.map(|doc| self.instance(doc)))
    }

    /// Merge `update` onto every matching document.
    pub async fn update(&self, filter: impl Into<Filter>, update: Document) -> Result<(), ModelError> {
        let backend = self.shared_backend()?;
        let filter = self.filter(filter);

        debug!(model = %self.name(), filter = ?filter, "update");
        backend.update(self, &filter, &update).await
    }

    /// Remove every matching document.
    pub async fn remove(&self, filter: impl Into<Filter>) -> Result<(), ModelError> {
        let backend = self.shared_backend()?;
        let filter = self.filter(filter);

        debug!(model = %self.name(), filter = ?filter, "remove");
        backend.remove(self, &filter).await
    }

    /// Map every stored document and fold the results with `reduce`.
    pub async fn map_reduce<M, R>(&self, map: M, reduce: R) -> Result<Value, ModelError>
    where
        M: Fn(&Document) -> Value + Send + Sync + 'static,
        R: Fn(Value, Value) -> Value + Send + Sync + 'static,
    {
        let backend = self.shared_backend()?;
        backend.map_reduce(self, &map, &reduce).await
    }
}
