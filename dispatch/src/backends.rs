//! Model families available to the dispatcher.
//!
//! Every backend composes its own input from a [`StructuredPrompt`]: the chat
//! tuned models receive the sections as separate messages, the others get the
//! framed document as one block of text. The actual generation is delegated to
//! a [`TextGenerator`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::client::OllamaGenerator;
use crate::config::DispatchConfig;
use crate::model::{CodeLlamaSize, Device, Llama2Size, ModelName};
use crate::prompt::{Section, StructuredPrompt};
use crate::traits::{
    BackendFactory, Completion, LlmError, Message, ModelBackend, SamplingOptions, TextGenerator,
};

/// Summary and affected files with their markers, preceded by the rules when
/// requested.
fn commit_context(prompt: &StructuredPrompt, include_rules: bool) -> String {
    let mut sections = Vec::with_capacity(3);
    if include_rules {
        sections.push(Section::Rules);
    }
    sections.extend([Section::Summary, Section::AffectedFiles]);
    sections
        .into_iter()
        .filter_map(|s| s.marker().map(|m| format!("{m}\n\n{}", prompt.section(s))))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Mixtral 8x7B instruct. The commit context is presented as an assistant
/// turn between the instructions and the final question.
pub struct Mixtral8x7BInstruct {
    generator: Arc<dyn TextGenerator>,
    device: Device,
}

impl Mixtral8x7BInstruct {
    pub const MODEL_ID: &'static str = "mixtral:8x7b-instruct-v0.1";

    pub fn new(generator: Arc<dyn TextGenerator>, device: Device) -> Self {
        Self { generator, device }
    }

    fn completion(&self, prompt: &StructuredPrompt, include_rules: bool) -> Completion {
        Completion::Chat {
            model: Self::MODEL_ID.to_string(),
            messages: vec![
                Message::user(prompt.instructions.clone()),
                Message::assistant(commit_context(prompt, include_rules)),
                Message::user(prompt.result.clone()),
            ],
            options: SamplingOptions::new(self.device).max_new_tokens(100),
        }
    }
}

#[async_trait]
impl ModelBackend for Mixtral8x7BInstruct {
    fn name(&self) -> ModelName {
        ModelName::Mixtral8x7BInstruct
    }

    fn model_id(&self) -> &str {
        Self::MODEL_ID
    }

    async fn generate(
        &self,
        prompt: &StructuredPrompt,
        include_rules: bool,
    ) -> Result<String, LlmError> {
        self.generator
            .complete(self.completion(prompt, include_rules))
            .await
    }
}

/// Llama 2 chat in one of three sizes.
///
/// Sampled with a low temperature; the model needs the rules to answer in a
/// usable form.
pub struct Llama2Chat {
    generator: Arc<dyn TextGenerator>,
    device: Device,
    model_id: String,
}

impl Llama2Chat {
    pub fn new(generator: Arc<dyn TextGenerator>, size: Llama2Size, device: Device) -> Self {
        Self {
            generator,
            device,
            model_id: format!("llama2:{size}-chat"),
        }
    }
}

#[async_trait]
impl ModelBackend for Llama2Chat {
    fn name(&self) -> ModelName {
        ModelName::Llama2Chat
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(
        &self,
        prompt: &StructuredPrompt,
        include_rules: bool,
    ) -> Result<String, LlmError> {
        if !include_rules {
            return Err(LlmError::UnsupportedConfiguration(self.name()));
        }
        let text = prompt.render(true);
        let options = SamplingOptions::new(self.device)
            .max_new_tokens(10_000)
            .temperature(0.3)
            .top_k(10)
            .top_p(0.3);
        let output = self
            .generator
            .complete(Completion::Raw {
                model: self.model_id.clone(),
                prompt: text.clone(),
                system: None,
                options,
            })
            .await?;
        Ok(output.replace(&text, "").trim().to_string())
    }
}

/// Code Llama instruct in one of four sizes. Everything but the final
/// question goes into the system message.
pub struct CodeLlamaInstruct {
    generator: Arc<dyn TextGenerator>,
    device: Device,
    model_id: String,
}

impl CodeLlamaInstruct {
    pub fn new(generator: Arc<dyn TextGenerator>, size: CodeLlamaSize, device: Device) -> Self {
        Self {
            generator,
            device,
            model_id: format!("codellama:{size}-instruct"),
        }
    }
}

#[async_trait]
impl ModelBackend for CodeLlamaInstruct {
    fn name(&self) -> ModelName {
        ModelName::CodeLlamaInstruct
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(
        &self,
        prompt: &StructuredPrompt,
        include_rules: bool,
    ) -> Result<String, LlmError> {
        let system = format!(
            "{}\n\n{}",
            prompt.instructions,
            commit_context(prompt, include_rules)
        );
        self.generator
            .complete(Completion::Chat {
                model: self.model_id.clone(),
                messages: vec![Message::system(system), Message::user(prompt.result.clone())],
                options: SamplingOptions::new(self.device).max_new_tokens(200),
            })
            .await
    }
}

/// Gemma 7B instruct, prompted with the framed document.
pub struct Gemma7BInstruct {
    generator: Arc<dyn TextGenerator>,
    device: Device,
}

impl Gemma7BInstruct {
    pub const MODEL_ID: &'static str = "gemma:7b-instruct";

    pub fn new(generator: Arc<dyn TextGenerator>, device: Device) -> Self {
        Self { generator, device }
    }
}

#[async_trait]
impl ModelBackend for Gemma7BInstruct {
    fn name(&self) -> ModelName {
        ModelName::Gemma7BInstruct
    }

    fn model_id(&self) -> &str {
        Self::MODEL_ID
    }

    async fn generate(
        &self,
        prompt: &StructuredPrompt,
        include_rules: bool,
    ) -> Result<String, LlmError> {
        self.generator
            .complete(Completion::Raw {
                model: Self::MODEL_ID.to_string(),
                prompt: prompt.render(include_rules),
                system: None,
                options: SamplingOptions::new(self.device).max_new_tokens(200),
            })
            .await
    }
}

/// Builds backends that run on an Ollama server.
pub struct OllamaFactory {
    generator: OllamaGenerator,
    config: DispatchConfig,
}

impl OllamaFactory {
    pub fn new(config: DispatchConfig) -> Result<Self, LlmError> {
        let generator = OllamaGenerator::new(&config.ollama_url)?;
        Ok(Self { generator, config })
    }

    /// Instantiate the backend for `name` without touching the server.
    pub fn build(&self, name: ModelName) -> Arc<dyn ModelBackend> {
        let generator: Arc<dyn TextGenerator> = Arc::new(self.generator.clone());
        let device = self.config.device;
        match name {
            ModelName::Mixtral8x7BInstruct => Arc::new(Mixtral8x7BInstruct::new(generator, device)),
            ModelName::Llama2Chat => {
                Arc::new(Llama2Chat::new(generator, self.config.llama2_size, device))
            }
            ModelName::CodeLlamaInstruct => Arc::new(CodeLlamaInstruct::new(
                generator,
                self.config.codellama_size,
                device,
            )),
            ModelName::Gemma7BInstruct => Arc::new(Gemma7BInstruct::new(generator, device)),
        }
    }
}

#[async_trait]
impl BackendFactory for OllamaFactory {
    async fn create(&self, name: ModelName) -> Result<Arc<dyn ModelBackend>, LlmError> {
        let backend = self.build(name);
        if self.config.pull_models {
            self.generator.ensure_model(backend.model_id()).await?;
        }
        info!(model = %name, id = backend.model_id(), device = %self.config.device, "backend ready");
        Ok(backend)
    }
}
