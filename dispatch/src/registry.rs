//! Lazily constructed backends, one per [`ModelName`].
//!
//! The registry owns a slot for every known name. A slot is filled the first
//! time its backend is requested and is never emptied afterwards.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::OnceCell;
use tracing::info;

use crate::model::ModelName;
use crate::traits::{BackendFactory, LlmError, ModelBackend};

pub struct ModelRegistry {
    factory: Arc<dyn BackendFactory>,
    slots: HashMap<ModelName, OnceCell<Arc<dyn ModelBackend>>>,
}

impl ModelRegistry {
    pub fn new(factory: Arc<dyn BackendFactory>) -> Self {
        let slots = ModelName::ALL
            .into_iter()
            .map(|name| (name, OnceCell::new()))
            .collect();
        Self { factory, slots }
    }

    /// Names this registry can construct.
    pub fn known(&self) -> impl Iterator<Item = ModelName> {
        ModelName::ALL.into_iter()
    }

    /// Whether the backend for `name` has been constructed.
    pub fn is_loaded(&self, name: ModelName) -> bool {
        self.slots.get(&name).is_some_and(|slot| slot.initialized())
    }

    /// Names of every constructed backend.
    pub fn loaded(&self) -> Vec<ModelName> {
        self.known().filter(|n| self.is_loaded(*n)).collect()
    }

    /// Return the backend for `name`, constructing it on first use.
    ///
    /// Concurrent first requests for the same name construct it once. A
    /// failed construction leaves the slot empty.
    pub async fn get_or_create(&self, name: ModelName) -> Result<Arc<dyn ModelBackend>, LlmError> {
        let slot = self
            .slots
            .get(&name)
            .ok_or_else(|| LlmError::UnknownModel(name.to_string()))?;
        let backend = slot
            .get_or_try_init(|| async {
                let start = Instant::now();
                let backend = self.factory.create(name).await?;
                info!(model = %name, elapsed = ?start.elapsed(), "constructed backend");
                Ok::<_, LlmError>(backend)
            })
            .await?;
        Ok(backend.clone())
    }

    /// Like [`get_or_create`](Self::get_or_create) for a name given as text.
    /// Unknown names fail before anything is constructed.
    pub async fn get_or_create_named(&self, name: &str) -> Result<Arc<dyn ModelBackend>, LlmError> {
        let name: ModelName = name.parse()?;
        self.get_or_create(name).await
    }
}
