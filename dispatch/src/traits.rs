use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Device, ModelName};
use crate::prompt::{ParseError, StructuredPrompt};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LlmError {
    #[error("the model \"{0}\" is not known")]
    UnknownModel(String),
    #[error("malformed prompt: {0}")]
    Parse(#[from] ParseError),
    #[error("{0} does not work correctly without rules")]
    UnsupportedConfiguration(ModelName),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("generation was aborted before producing a result")]
    Aborted,
}

/// Speaker roles for a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Message in a chat exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Decoding parameters passed along with a [`Completion`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SamplingOptions {
    pub max_new_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_k: Option<u32>,
    pub top_p: Option<f32>,
    pub device: Device,
}

impl SamplingOptions {
    pub fn new(device: Device) -> Self {
        Self { device, ..Self::default() }
    }

    pub fn max_new_tokens(mut self, n: u32) -> Self {
        self.max_new_tokens = Some(n);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    pub fn top_k(mut self, k: u32) -> Self {
        self.top_k = Some(k);
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.top_p = Some(p);
        self
    }
}

/// A single request to the underlying text generator.
#[derive(Clone, Debug, PartialEq)]
pub enum Completion {
    /// Plain text continuation of `prompt`, optionally under a system prompt.
    Raw {
        model: String,
        prompt: String,
        system: Option<String>,
        options: SamplingOptions,
    },
    /// Chat-template completion of `messages`.
    Chat {
        model: String,
        messages: Vec<Message>,
        options: SamplingOptions,
    },
}

impl Completion {
    pub fn model(&self) -> &str {
        match self {
            Completion::Raw { model, .. } | Completion::Chat { model, .. } => model,
        }
    }
}

/// Opaque text generation capability offered by an ML runtime.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: Completion) -> Result<String, LlmError>;
}

/// A pretrained model wrapped for commit classification.
///
/// Each implementation decides how the [`StructuredPrompt`] is serialized
/// for its model.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    fn name(&self) -> ModelName;

    /// Identifier of the underlying model, e.g. an Ollama tag.
    fn model_id(&self) -> &str;

    async fn generate(
        &self,
        prompt: &StructuredPrompt,
        include_rules: bool,
    ) -> Result<String, LlmError>;
}

/// Builds backends on demand for the registry.
#[async_trait]
pub trait BackendFactory: Send + Sync {
    async fn create(&self, name: ModelName) -> Result<Arc<dyn ModelBackend>, LlmError>;
}
