//! Routing of commit-classification prompts to large language models.
//!
//! The `dispatch` crate splits a composite prompt into its sections
//! ([`prompt`]), wraps several model families behind the [`ModelBackend`]
//! trait ([`backends`]), constructs each backend lazily ([`ModelRegistry`])
//! and runs submissions without blocking the caller while allowing only one
//! generation per model at a time ([`Dispatcher`]).

pub mod backends;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod handle;
pub mod model;
pub mod prompt;
pub mod registry;
pub mod task;
pub mod traits;

pub use backends::{
    CodeLlamaInstruct, Gemma7BInstruct, Llama2Chat, Mixtral8x7BInstruct, OllamaFactory,
};
pub use client::OllamaGenerator;
pub use config::DispatchConfig;
pub use dispatcher::Dispatcher;
pub use handle::{Handle, Outcome};
pub use model::{CodeLlamaSize, Device, Llama2Size, ModelName};
pub use prompt::{split, ParseError, Section, StructuredPrompt};
pub use registry::ModelRegistry;
pub use task::PromptRequest;
pub use traits::{
    BackendFactory, Completion, LlmError, Message, ModelBackend, Role, SamplingOptions,
    TextGenerator,
};
