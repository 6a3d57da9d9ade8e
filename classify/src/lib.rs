//! Command line driver for the `dispatch` crate.
//!
//! Reads a composite commit prompt, submits it to the requested models at
//! once and reports every outcome.

use std::path::PathBuf;

use clap::Parser;
use dispatch::{
    CodeLlamaSize, Device, DispatchConfig, Dispatcher, Llama2Size, ModelName, PromptRequest,
};
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tracing::info;

pub mod logging;

pub use logging::init_logging;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Model to query; repeat for several. Defaults to every known model.
    #[arg(short, long = "model")]
    pub models: Vec<String>,

    /// File holding the prompt. Read from stdin when omitted.
    #[arg(short, long)]
    pub prompt_file: Option<PathBuf>,

    /// Leave the rules section out of the model input
    #[arg(long)]
    pub no_rules: bool,

    /// Print the known model names and exit
    #[arg(long)]
    pub list: bool,

    /// Print one JSON object per model instead of plain text
    #[arg(long)]
    pub json: bool,

    /// Base URL of the Ollama server. Overrides OLLAMA_URL.
    #[arg(long)]
    pub ollama_url: Option<String>,

    /// Compute device, gpu or cpu. Overrides LLM_DEVICE.
    #[arg(long)]
    pub device: Option<Device>,

    #[arg(long)]
    pub llama2_size: Option<Llama2Size>,

    #[arg(long)]
    pub codellama_size: Option<CodeLlamaSize>,

    /// Pull missing models before first use
    #[arg(long)]
    pub pull: bool,
}

impl Cli {
    /// Configuration from the environment with command line flags on top.
    pub fn config(&self) -> DispatchConfig {
        let mut config = DispatchConfig::from_env();
        if let Some(url) = &self.ollama_url {
            config.ollama_url = url.clone();
        }
        if let Some(device) = self.device {
            config.device = device;
        }
        if let Some(size) = self.llama2_size {
            config.llama2_size = size;
        }
        if let Some(size) = self.codellama_size {
            config.codellama_size = size;
        }
        if self.pull {
            config.pull_models = true;
        }
        config
    }

    /// Requested model names, or all of them.
    pub fn model_names(&self) -> Vec<String> {
        if self.models.is_empty() {
            ModelName::ALL.iter().map(|m| m.to_string()).collect()
        } else {
            self.models.clone()
        }
    }

    pub async fn read_prompt(&self) -> anyhow::Result<String> {
        match &self.prompt_file {
            Some(path) => Ok(tokio::fs::read_to_string(path).await?),
            None => {
                let mut prompt = String::new();
                tokio::io::stdin().read_to_string(&mut prompt).await?;
                Ok(prompt)
            }
        }
    }
}

/// Outcome of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Plain text rendering used on stdout.
    pub fn to_text(&self) -> String {
        match (&self.output, &self.error) {
            (_, Some(e)) => format!("== {} ==\nerror: {e}", self.model),
            (Some(out), None) => format!("== {} ==\n{out}", self.model),
            (None, None) => format!("== {} ==", self.model),
        }
    }
}

/// Submit `prompt` to every model in `models` and wait for all of them.
///
/// All submissions are made before the first one is awaited, so distinct
/// models work concurrently.
pub async fn classify_all(
    dispatcher: &Dispatcher,
    models: &[String],
    prompt: &str,
    include_rules: bool,
) -> Vec<Report> {
    let handles: Vec<_> = models
        .iter()
        .map(|m| {
            let request = PromptRequest::new(prompt).include_rules(include_rules);
            (m.clone(), dispatcher.submit_request(m, request))
        })
        .collect();
    info!(count = handles.len(), "submitted prompt");

    let mut reports = Vec::with_capacity(handles.len());
    for (model, handle) in handles {
        let report = match handle.await {
            Ok(output) => Report { model, output: Some(output), error: None },
            Err(e) => Report { model, output: None, error: Some(e.to_string()) },
        };
        reports.push(report);
    }
    reports
}
