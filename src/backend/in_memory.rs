//! MemoryBackend - HashMap-backed storage for tests and development.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};
use uuid::Uuid;

use super::filter::{matches, merge};
use super::{Backend, MapFn, ReduceFn};
use crate::error::ModelError;
use crate::field::FieldKind;
use crate::model::{Instance, Model};
use crate::Document;

/// How auto id fields are filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Random UUID v4 strings.
    #[default]
    Uuid,
    /// Per-collection counters starting at 1.
    Sequential,
}

/// Settings for [`MemoryBackend`]. Loadable from JSON; missing entries take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub name: String,
    pub id_strategy: IdStrategy,
    /// First value handed out by auto increment fields.
    pub increment_start: i64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            name: "memory".to_string(),
            id_strategy: IdStrategy::default(),
            increment_start: 1,
        }
    }
}

/// One model's documents, stored as serde_json bytes under their encoded key.
#[derive(Default)]
struct Collection {
    documents: IndexMap<String, Vec<u8>>,
    next_increment: Option<i64>,
    next_id: u64,
}

type Storage = HashMap<String, Collection>;

/// In-memory backend implementing the full adapter contract.
///
/// Storage key is the JSON encoding of the model's key values, so
/// multi-part keys need no special casing. Clone-friendly via Arc; clones
/// share storage.
#[derive(Clone)]
pub struct MemoryBackend {
    config: MemoryConfig,
    storage: Arc<RwLock<Storage>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_config(MemoryConfig::default())
    }

    pub fn with_config(config: MemoryConfig) -> Self {
        Self {
            config,
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn builder() -> MemoryBackendBuilder {
        MemoryBackendBuilder::default()
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Number of documents stored for `model`.
    pub fn count(&self, model: &str) -> usize {
        self.storage
            .read()
            .map(|storage| storage.get(model).map_or(0, |c| c.documents.len()))
            .unwrap_or(0)
    }

    fn read(&self, operation: &'static str, model: &Model) -> Result<RwLockReadGuard<'_, Storage>, ModelError> {
        self.storage
            .read()
            .map_err(|_| ModelError::backend(operation, model.name(), "lock poisoned"))
    }

    fn write(&self, operation: &'static str, model: &Model) -> Result<RwLockWriteGuard<'_, Storage>, ModelError> {
        self.storage
            .write()
            .map_err(|_| ModelError::backend(operation, model.name(), "lock poisoned"))
    }

    fn generate_id(&self, collection: &mut Collection) -> Value {
        match self.config.id_strategy {
            IdStrategy::Uuid => Value::String(Uuid::new_v4().to_string()),
            IdStrategy::Sequential => {
                collection.next_id += 1;
                Value::from(collection.next_id)
            }
        }
    }

    fn next_increment(&self, collection: &mut Collection) -> i64 {
        let next = collection.next_increment.unwrap_or(self.config.increment_start);
        collection.next_increment = Some(next + 1);
        next
    }
}

fn encode(operation: &'static str, model: &Model, document: &Document) -> Result<Vec<u8>, ModelError> {
    serde_json::to_vec(document).map_err(|e| ModelError::backend(operation, model.name(), e.to_string()))
}

fn decode(operation: &'static str, model: &Model, bytes: &[u8]) -> Result<Document, ModelError> {
    serde_json::from_slice(bytes).map_err(|e| ModelError::backend(operation, model.name(), e.to_string()))
}

/// Encode the model's key values from `document`. Fails when every key
/// value is missing.
fn storage_key(operation: &'static str, model: &Model, document: &Document) -> Result<String, ModelError> {
    let values: Vec<Value> = model
        .keys()
        .iter()
        .map(|key| document.get(key).cloned().unwrap_or(Value::Null))
        .collect();

    if values.iter().all(Value::is_null) {
        return Err(ModelError::backend(
            operation,
            model.name(),
            "cannot store a document without a key",
        ));
    }

    serde_json::to_string(&values).map_err(|e| ModelError::backend(operation, model.name(), e.to_string()))
}

/// Decode every document of a collection that matches `filter`, with its
/// storage key.
fn matching(
    operation: &'static str,
    model: &Model,
    collection: &Collection,
    filter: &Document,
) -> Result<Vec<(String, Document)>, ModelError> {
    let mut found = Vec::new();
    for (key, bytes) in &collection.documents {
        let document = decode(operation, model, bytes)?;
        if matches(&document, filter) {
            found.push((key.clone(), document));
        }
    }
    Ok(found)
}

/// Apply `update` to every `found` document, moving the ones whose key
/// changes. Every new key is checked before anything is written, so a key
/// collision leaves the collection untouched.
fn rewrite(
    operation: &'static str,
    model: &Model,
    collection: &mut Collection,
    found: Vec<(String, Document)>,
    update: &Document,
) -> Result<Vec<Document>, ModelError> {
    let mut planned = Vec::with_capacity(found.len());
    for (key, mut document) in found {
        merge(&mut document, update);
        let new_key = storage_key(operation, model, &document)?;
        let bytes = encode(operation, model, &document)?;
        planned.push((key, new_key, document, bytes));
    }

    let vacated: HashSet<&str> = planned.iter().map(|(key, ..)| key.as_str()).collect();
    let mut claimed = HashSet::new();
    for (_, new_key, ..) in &planned {
        let taken = collection.documents.contains_key(new_key) && !vacated.contains(new_key.as_str());
        if taken || !claimed.insert(new_key.as_str()) {
            return Err(ModelError::backend(operation, model.name(), "key already exists"));
        }
    }

    for (key, new_key, ..) in &planned {
        if key != new_key {
            collection.documents.shift_remove(key);
        }
    }

    let mut updated = Vec::with_capacity(planned.len());
    for (_, new_key, document, bytes) in planned {
        trace!(model = %model.name(), key = %new_key, "updated document");
        collection.documents.insert(new_key, bytes);
        updated.push(document);
    }
    Ok(updated)
}

#[async_trait]
impl Backend for MemoryBackend {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn connect(&self) -> Result<(), ModelError> {
        debug!(backend = %self.config.name, "connected");
        Ok(())
    }

    async fn store(
        &self,
        instance: &Instance,
        prepared: Document,
    ) -> Result<Option<Document>, ModelError> {
        let model = instance.model();
        let mut storage = self.write("store", model)?;
        let collection = storage.entry(model.name().to_string()).or_default();

        let mut document = prepared;
        for field in model.fields() {
            let name = field.name();
            match field.kind() {
                FieldKind::AutoId => {
                    let assigned = instance
                        .field(name)
                        .and_then(|value| value.as_value())
                        .filter(|value| !value.is_null())
                        .cloned();
                    let id = match assigned {
                        Some(id) => id,
                        None => self.generate_id(collection),
                    };
                    document.insert(name.to_string(), id);
                }
                FieldKind::AutoIncrement => match document.get(name).and_then(Value::as_i64) {
                    Some(current) => {
                        let next = collection.next_increment.unwrap_or(self.config.increment_start);
                        collection.next_increment = Some(next.max(current + 1));
                    }
                    None => {
                        let next = self.next_increment(collection);
                        document.insert(name.to_string(), Value::from(next));
                    }
                },
                _ => {}
            }
        }

        let key = storage_key("store", model, &document)?;
        let stored = match collection.documents.get(&key) {
            Some(bytes) => {
                let mut existing = decode("store", model, bytes)?;
                merge(&mut existing, &document);
                existing
            }
            None => document,
        };

        trace!(model = %model.name(), key = %key, "stored document");
        collection
            .documents
            .insert(key, encode("store", model, &stored)?);
        Ok(Some(stored))
    }

    async fn remove(&self, model: &Model, filter: &Document) -> Result<(), ModelError> {
        let mut storage = self.write("remove", model)?;
        let collection = match storage.get_mut(model.name()) {
            Some(collection) => collection,
            None => return Ok(()),
        };

        for (key, _) in matching("remove", model, collection, filter)? {
            trace!(model = %model.name(), key = %key, "removed document");
            collection.documents.shift_remove(&key);
        }
        Ok(())
    }

    async fn find(&self, model: &Model, filter: &Document) -> Result<Vec<Document>, ModelError> {
        let storage = self.read("find", model)?;
        match storage.get(model.name()) {
            Some(collection) => Ok(matching("find", model, collection, filter)?
                .into_iter()
                .map(|(_, document)| document)
                .collect()),
            None => Ok(Vec::new()),
        }
    }

    async fn find_one_and_update(
        &self,
        model: &Model,
        filter: &Document,
        update: &Document,
    ) -> Result<Option<Document>, ModelError> {
        let mut storage = self.write("find_one_and_update", model)?;
        let collection = match storage.get_mut(model.name()) {
            Some(collection) => collection,
            None => return Ok(None),
        };

        let first: Vec<_> = matching("find_one_and_update", model, collection, filter)?
            .into_iter()
            .take(1)
            .collect();
        if first.is_empty() {
            return Ok(None);
        }
        Ok(rewrite("find_one_and_update", model, collection, first, update)?
            .into_iter()
            .next())
    }

    async fn update(
        &self,
        model: &Model,
        filter: &Document,
        update: &Document,
    ) -> Result<(), ModelError> {
        let mut storage = self.write("update", model)?;
        let collection = match storage.get_mut(model.name()) {
            Some(collection) => collection,
            None => return Ok(()),
        };

        let found = matching("update", model, collection, filter)?;
        rewrite("update", model, collection, found, update)?;
        Ok(())
    }

    async fn map_reduce(
        &self,
        model: &Model,
        map: &MapFn,
        reduce: &ReduceFn,
    ) -> Result<Value, ModelError> {
        let storage = self.read("map_reduce", model)?;
        let collection = match storage.get(model.name()) {
            Some(collection) => collection,
            None => return Ok(Value::Null),
        };

        let mut mapped = Vec::with_capacity(collection.documents.len());
        for bytes in collection.documents.values() {
            mapped.push(map(&decode("map_reduce", model, bytes)?));
        }
        Ok(mapped.into_iter().reduce(|acc, value| reduce(acc, value)).unwrap_or(Value::Null))
    }
}

/// Builder for [`MemoryBackend`].
#[derive(Debug, Clone, Default)]
pub struct MemoryBackendBuilder {
    config: MemoryConfig,
}

impl MemoryBackendBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.config.id_strategy = strategy;
        self
    }

    pub fn increment_start(mut self, start: i64) -> Self {
        self.config.increment_start = start;
        self
    }

    pub fn build(self) -> MemoryBackend {
        MemoryBackend::with_config(self.config)
    }
}
