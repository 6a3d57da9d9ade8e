use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{CodeLlamaSize, Device, Llama2Size};

/// Settings used when backends are instantiated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Base URL of the Ollama server.
    pub ollama_url: String,
    pub device: Device,
    pub llama2_size: Llama2Size,
    pub codellama_size: CodeLlamaSize,
    /// Pull missing models from the registry when a backend is first used.
    pub pull_models: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".into(),
            device: Device::default(),
            llama2_size: Llama2Size::default(),
            codellama_size: CodeLlamaSize::default(),
            pull_models: false,
        }
    }
}

impl DispatchConfig {
    /// Read the configuration from the environment.
    ///
    /// `OLLAMA_URL`, `LLM_DEVICE`, `LLAMA2_SIZE`, `CODELLAMA_SIZE` and
    /// `LLM_PULL_MODELS` override the defaults. Unparseable values are logged
    /// and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup("OLLAMA_URL") {
            config.ollama_url = url;
        }
        if let Some(device) = parsed(&lookup, "LLM_DEVICE") {
            config.device = device;
        }
        if let Some(size) = parsed(&lookup, "LLAMA2_SIZE") {
            config.llama2_size = size;
        }
        if let Some(size) = parsed(&lookup, "CODELLAMA_SIZE") {
            config.codellama_size = size;
        }
        if let Some(pull) = lookup("LLM_PULL_MODELS") {
            config.pull_models = matches!(pull.as_str(), "1" | "true" | "yes");
        }
        config
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw = lookup(key)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(%key, error = %e, "ignoring invalid setting");
            None
        }
    }
}
