//! Non-blocking submission of prompts to named models.
//!
//! The [`Dispatcher`] owns a [`ModelRegistry`] and one lock per known model.
//! [`Dispatcher::submit`] returns a [`Handle`] straight away and runs the
//! generation on the Tokio runtime: the unit of work waits for the model's
//! lock, resolves the backend, splits the prompt and generates. At most one
//! generation per model is in flight; different models run side by side.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::backends::OllamaFactory;
use crate::config::DispatchConfig;
use crate::handle::{Handle, Outcome};
use crate::model::ModelName;
use crate::prompt;
use crate::registry::ModelRegistry;
use crate::task::PromptRequest;
use crate::traits::{BackendFactory, LlmError};

#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    registry: ModelRegistry,
    locks: HashMap<ModelName, Mutex<()>>,
}

impl Dispatcher {
    pub fn new(registry: ModelRegistry) -> Self {
        let locks = ModelName::ALL
            .into_iter()
            .map(|name| (name, Mutex::new(())))
            .collect();
        Self {
            inner: Arc::new(Inner { registry, locks }),
        }
    }

    /// Dispatcher whose backends are built by `factory`.
    pub fn with_factory(factory: Arc<dyn BackendFactory>) -> Self {
        Self::new(ModelRegistry::new(factory))
    }

    /// Dispatcher running every model on the Ollama server in `config`.
    pub fn from_config(config: DispatchConfig) -> Result<Self, LlmError> {
        Ok(Self::with_factory(Arc::new(OllamaFactory::new(config)?)))
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.inner.registry
    }

    /// Names accepted by [`submit`](Self::submit).
    pub fn available_models(&self) -> Vec<&'static str> {
        self.inner.registry.known().map(ModelName::as_str).collect()
    }

    /// Whether a generation for `name` currently holds the model's lock.
    pub fn is_busy(&self, name: ModelName) -> bool {
        self.inner
            .locks
            .get(&name)
            .is_some_and(|lock| lock.try_lock().is_err())
    }

    /// Submit `prompt` to `model`, keeping the rules section.
    ///
    /// Must be called from within a Tokio runtime. Every failure, including
    /// an unknown model name, is reported through the returned [`Handle`].
    pub fn submit(&self, model: &str, prompt: impl Into<String>) -> Handle {
        self.submit_request(model, PromptRequest::new(prompt))
    }

    pub fn submit_request(&self, model: &str, request: impl Into<PromptRequest>) -> Handle {
        let name = match model.parse::<ModelName>() {
            Ok(name) => name,
            Err(e) => {
                warn!(%model, "rejected submission for unknown model");
                return Handle::resolved(Err(e));
            }
        };
        self.submit_to(name, request)
    }

    /// Submit to a model named by its typed identifier.
    pub fn submit_to(&self, name: ModelName, request: impl Into<PromptRequest>) -> Handle {
        let request = request.into();
        let (resolver, handle) = Handle::pending();
        let inner = self.inner.clone();
        let span = info_span!("generate", model = %name);
        tokio::spawn(
            async move {
                let outcome = inner.run(name, request).await;
                if let Err(e) = &outcome {
                    warn!(error = %e, "generation failed");
                }
                resolver.resolve(outcome);
            }
            .instrument(span),
        );
        handle
    }
}

impl Inner {
    async fn run(&self, name: ModelName, request: PromptRequest) -> Outcome {
        let lock = self
            .locks
            .get(&name)
            .ok_or_else(|| LlmError::UnknownModel(name.to_string()))?;
        let _guard = LockLog(lock.lock().await);
        debug!("acquired model lock");

        let backend = self.registry.get_or_create(name).await?;
        let structured = prompt::split(&request.prompt)?;
        let start = Instant::now();
        let text = backend
            .generate(&structured, request.include_rules)
            .await?;
        info!(elapsed = ?start.elapsed(), chars = text.len(), "generation finished");
        Ok(text)
    }
}

/// Model lock guard that logs its release, including on early return.
struct LockLog<'a>(MutexGuard<'a, ()>);

impl Drop for LockLog<'_> {
    fn drop(&mut self) {
        debug!("released model lock");
    }
}
