//! Namespaces - named collections of models sharing one backend.
//!
//! A [`Namespace`] compiles schemas into [`Model`]s, keeps model names
//! unique, and lets reference fields name their targets before those are
//! defined. A [`Registry`] hands out namespaces by name; the process-wide
//! default registry sits behind [`crate::namespace`].
//!
//! ## Example
//!
//! ```ignore
//! use omega_models::{fields, MemoryBackend, Registry, Schema};
//!
//! let registry = Registry::new();
//! let ns = registry.namespace("blog");
//! ns.backend(MemoryBackend::new())
//!     .define([
//!         ("Post", Schema::new().field("author", fields::reference("User"))),
//!         ("User", Schema::new().field("nick", fields::string().key())),
//!     ])?;
//! ns.connect().await?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use indexmap::IndexMap;
use tracing::debug;

use crate::backend::Backend;
use crate::error::ModelError;
use crate::model::Model;
use crate::schema::Schema;

pub(crate) struct NamespaceInner {
    name: String,
    models: RwLock<IndexMap<String, Model>>,
    backend: RwLock<Option<Arc<dyn Backend>>>,
}

/// A named set of models. Clone-friendly via Arc; clones share state.
#[derive(Clone)]
pub struct Namespace {
    inner: Arc<NamespaceInner>,
}

impl Namespace {
    /// A standalone namespace, not tracked by any registry.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(NamespaceInner {
                name: name.into(),
                models: RwLock::new(IndexMap::new()),
                backend: RwLock::new(None),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<NamespaceInner>) -> Self {
        Self { inner }
    }

    fn downgrade(&self) -> Weak<NamespaceInner> {
        Arc::downgrade(&self.inner)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Compile and register a batch of schemas.
    ///
    /// The batch is all-or-nothing: if any name is already taken, repeats
    /// within the batch, or fails to compile, no model is registered.
    pub fn define<I, S>(&self, schemas: I) -> Result<&Self, ModelError>
    where
        I: IntoIterator<Item = (S, Schema)>,
        S: Into<String>,
    {
        let mut compiled: IndexMap<String, Model> = IndexMap::new();
        for (name, schema) in schemas {
            let name = name.into();
            if compiled.contains_key(&name) {
                return Err(ModelError::definition(format!(
                    "model {} is defined twice in one batch",
                    name
                )));
            }
            let model = Model::compile(name.clone(), schema, self.downgrade())?;
            compiled.insert(name, model);
        }

        let mut models = self
            .inner
            .models
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(taken) = compiled.keys().find(|name| models.contains_key(*name)) {
            return Err(ModelError::definition(format!(
                "model {} is already defined in namespace {}",
                taken,
                self.name()
            )));
        }

        for (name, model) in compiled {
            debug!(namespace = %self.name(), model = %name, "defined model");
            models.insert(name, model);
        }
        Ok(self)
    }

    /// Set the backend shared by every model in this namespace.
    pub fn backend<B: Backend + 'static>(&self, backend: B) -> &Self {
        self.set_backend(Arc::new(backend))
    }

    pub fn set_backend(&self, backend: Arc<dyn Backend>) -> &Self {
        debug!(namespace = %self.name(), backend = %backend.name(), "attached backend");
        *self
            .inner
            .backend
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(backend);
        self
    }

    pub fn shared_backend(&self) -> Option<Arc<dyn Backend>> {
        self.inner
            .backend
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Connect the shared backend.
    pub async fn connect(&self) -> Result<(), ModelError> {
        let backend = self.shared_backend().ok_or_else(|| {
            ModelError::backend("connect", self.name(), "no backend configured")
        })?;
        backend.connect().await
    }

    pub fn model(&self, name: &str) -> Option<Model> {
        self.inner
            .models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Model names, in definition order.
    pub fn model_names(&self) -> Vec<String> {
        self.inner
            .models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn ptr_eq(&self, other: &Namespace) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.name())
            .field("models", &self.model_names())
            .field("backend", &self.shared_backend().map(|b| b.name().to_string()))
            .finish()
    }
}

/// Namespaces by name. Clone-friendly via Arc.
#[derive(Clone, Default)]
pub struct Registry {
    namespaces: Arc<RwLock<HashMap<String, Namespace>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The namespace called `name`, created on first request.
    pub fn namespace(&self, name: &str) -> Namespace {
        if let Some(existing) = self.get(name) {
            return existing;
        }

        let mut namespaces = self
            .namespaces
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        namespaces
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(namespace = %name, "created namespace");
                Namespace::new(name)
            })
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Namespace> {
        self.namespaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .namespaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        f.debug_struct("Registry").field("namespaces", &names).finish()
    }
}
