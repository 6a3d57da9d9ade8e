//! HTTP client for running models on an Ollama server.
//!
//! This module provides the [`OllamaGenerator`] type which implements the
//! [`TextGenerator`] trait. Raw completions go through `/api/generate`, chat
//! completions through `/api/chat`; neither is streamed.

use crate::model::Device;
use crate::traits::{Completion, LlmError, Message, Role, SamplingOptions, TextGenerator};
use async_trait::async_trait;
use tracing::{debug, info};

use ollama_rs::{
    generation::{
        chat::{request::ChatMessageRequest, ChatMessage},
        completion::request::GenerationRequest,
    },
    models::ModelOptions,
    Ollama,
};

#[derive(Clone)]
pub struct OllamaGenerator {
    inner: Ollama,
}

impl OllamaGenerator {
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, LlmError> {
        let inner = Ollama::try_new(base_url.as_ref())
            .map_err(|e| LlmError::Backend(format!("invalid Ollama url: {e}")))?;
        Ok(Self { inner })
    }

    /// Make sure `model` is installed on the server, pulling it if needed.
    pub async fn ensure_model(&self, model: &str) -> Result<(), LlmError> {
        let installed = self
            .inner
            .list_local_models()
            .await
            .map_err(|e| LlmError::Backend(e.to_string()))?;
        if installed.iter().any(|m| same_tag(&m.name, model)) {
            debug!(%model, "model already installed");
            return Ok(());
        }
        info!(%model, "pulling model");
        self.inner
            .pull_model(model.to_string(), false)
            .await
            .map_err(|e| LlmError::Backend(e.to_string()))?;
        Ok(())
    }
}

fn same_tag(installed: &str, wanted: &str) -> bool {
    installed == wanted || installed.strip_suffix(":latest") == Some(wanted)
}

fn model_options(options: &SamplingOptions) -> ModelOptions {
    let mut out = ModelOptions::default();
    if let Some(n) = options.max_new_tokens {
        out = out.num_predict(i32::try_from(n).unwrap_or(i32::MAX));
    }
    if let Some(t) = options.temperature {
        out = out.temperature(t);
    }
    if let Some(k) = options.top_k {
        out = out.top_k(k);
    }
    if let Some(p) = options.top_p {
        out = out.top_p(p);
    }
    if options.device == Device::Cpu {
        out = out.num_gpu(0);
    }
    out
}

fn chat_message(message: &Message) -> ChatMessage {
    let content = message.content.clone();
    match message.role {
        Role::System => ChatMessage::system(content),
        Role::User => ChatMessage::user(content),
        Role::Assistant => ChatMessage::assistant(content),
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn complete(&self, request: Completion) -> Result<String, LlmError> {
        match request {
            Completion::Raw { model, prompt, system, options } => {
                let mut req =
                    GenerationRequest::new(model, prompt).options(model_options(&options));
                if let Some(system) = system {
                    req = req.system(system);
                }
                let res = self
                    .inner
                    .generate(req)
                    .await
                    .map_err(|e| LlmError::Backend(e.to_string()))?;
                Ok(res.response)
            }
            Completion::Chat { model, messages, options } => {
                let messages = messages.iter().map(chat_message).collect();
                let req =
                    ChatMessageRequest::new(model, messages).options(model_options(&options));
                let res = self
                    .inner
                    .send_chat_messages(req)
                    .await
                    .map_err(|e| LlmError::Backend(e.to_string()))?;
                Ok(res.message.content)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_suffix_matches_bare_tag() {
        assert!(same_tag("gemma:7b-instruct", "gemma:7b-instruct"));
        assert!(same_tag("mixtral:latest", "mixtral"));
        assert!(!same_tag("llama2:13b-chat", "llama2:7b-chat"));
    }

    #[test]
    fn token_limit_saturates() {
        let options = model_options(&SamplingOptions::default().max_new_tokens(u32::MAX));
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["num_predict"], i32::MAX);

        let options = model_options(&SamplingOptions::new(Device::Cpu).max_new_tokens(200));
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["num_predict"], 200);
        assert_eq!(json["num_gpu"], 0);
    }

    #[test]
    fn rejects_invalid_url() {
        assert!(matches!(
            OllamaGenerator::new("not a url"),
            Err(LlmError::Backend(_))
        ));
    }
}
