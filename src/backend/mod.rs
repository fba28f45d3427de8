//! Backends - the storage contract every adapter implements.
//!
//! Adapters receive prepared documents and structural filters and never see
//! resolved references: by the time a document reaches `store`, every
//! reference field holds its target's key mapping.
//!
//! [`filter::matches`] and [`filter::merge`] implement the shared filter and
//! update vocabulary so adapters agree on semantics.

pub mod filter;
#[cfg(feature = "memory")]
mod in_memory;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ModelError;
use crate::model::{Instance, Model};
use crate::Document;

#[cfg(feature = "memory")]
pub use in_memory::{IdStrategy, MemoryBackend, MemoryBackendBuilder, MemoryConfig};

/// Maps one stored document to a value.
pub type MapFn = dyn Fn(&Document) -> Value + Send + Sync;

/// Folds two mapped values into one.
pub type ReduceFn = dyn Fn(Value, Value) -> Value + Send + Sync;

/// Abstract storage for model documents.
///
/// Collections are named after the model. Every operation completes exactly
/// once with a `Result`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Identifies the adapter in logs and errors.
    fn name(&self) -> &str;

    async fn connect(&self) -> Result<(), ModelError> {
        Ok(())
    }

    /// Upsert `prepared` under the instance's key.
    ///
    /// Fills in absent auto id and auto increment fields, keeps stored fields
    /// that `prepared` leaves out, and may return the authoritative document
    /// to merge back into the instance.
    async fn store(
        &self,
        instance: &Instance,
        prepared: Document,
    ) -> Result<Option<Document>, ModelError>;

    /// Delete every matching document.
    async fn remove(&self, model: &Model, filter: &Document) -> Result<(), ModelError>;

    async fn find(&self, model: &Model, filter: &Document) -> Result<Vec<Document>, ModelError>;

    async fn find_one(
        &self,
        model: &Model,
        filter: &Document,
    ) -> Result<Option<Document>, ModelError> {
        Ok(self.find(model, filter).await?.into_iter().next())
    }

    /// Merge `update` onto one matching document and return the merged result.
    async fn find_one_and_update(
        &self,
        model: &Model,
        filter: &Document,
        update: &Document,
    ) -> Result<Option<Document>, ModelError>;

    /// Merge `update` onto every matching document.
    async fn update(
        &self,
        model: &Model,
        filter: &Document,
        update: &Document,
    ) -> Result<(), ModelError>;

    async fn map_reduce(
        &self,
        model: &Model,
        map: &MapFn,
        reduce: &ReduceFn,
    ) -> Result<Value, ModelError> {
        let _ = (map, reduce);
        Err(ModelError::NotImplemented {
            operation: "map_reduce",
            backend: format!("{} (model {})", self.name(), model.name()),
        })
    }
}
