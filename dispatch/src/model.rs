//! Names and parameters of the models the dispatcher knows about.
//!
//! [`ModelName`] is the closed set of backends. The remaining types describe
//! how a backend is instantiated: the compute [`Device`] and, for the model
//! families that come in several sizes, the size to load.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::traits::LlmError;

/// The closed set of backends that can be dispatched to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelName {
    Mixtral8x7BInstruct,
    Llama2Chat,
    CodeLlamaInstruct,
    Gemma7BInstruct,
}

impl ModelName {
    pub const ALL: [ModelName; 4] = [
        ModelName::Mixtral8x7BInstruct,
        ModelName::Llama2Chat,
        ModelName::CodeLlamaInstruct,
        ModelName::Gemma7BInstruct,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelName::Mixtral8x7BInstruct => "Mixtral8x7BInstruct",
            ModelName::Llama2Chat => "Llama2Chat",
            ModelName::CodeLlamaInstruct => "CodeLlamaInstruct",
            ModelName::Gemma7BInstruct => "Gemma7BInstruct",
        }
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelName {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelName::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| LlmError::UnknownModel(s.to_string()))
    }
}

/// Where the model weights are run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Gpu,
    Cpu,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Gpu => f.write_str("gpu"),
            Device::Cpu => f.write_str("cpu"),
        }
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gpu" | "cuda" => Ok(Device::Gpu),
            "cpu" => Ok(Device::Cpu),
            other => Err(format!("unknown device \"{other}\"")),
        }
    }
}

/// Parameter counts available for Llama 2 chat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Llama2Size {
    #[default]
    #[serde(rename = "7b")]
    B7,
    #[serde(rename = "13b")]
    B13,
    #[serde(rename = "70b")]
    B70,
}

impl Llama2Size {
    pub fn as_str(self) -> &'static str {
        match self {
            Llama2Size::B7 => "7b",
            Llama2Size::B13 => "13b",
            Llama2Size::B70 => "70b",
        }
    }
}

impl fmt::Display for Llama2Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Llama2Size {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "7b" => Ok(Llama2Size::B7),
            "13b" => Ok(Llama2Size::B13),
            "70b" => Ok(Llama2Size::B70),
            other => Err(format!("unsupported Llama 2 size \"{other}\"")),
        }
    }
}

/// Parameter counts available for Code Llama instruct.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeLlamaSize {
    #[default]
    #[serde(rename = "7b")]
    B7,
    #[serde(rename = "13b")]
    B13,
    #[serde(rename = "34b")]
    B34,
    #[serde(rename = "70b")]
    B70,
}

impl CodeLlamaSize {
    pub fn as_str(self) -> &'static str {
        match self {
            CodeLlamaSize::B7 => "7b",
            CodeLlamaSize::B13 => "13b",
            CodeLlamaSize::B34 => "34b",
            CodeLlamaSize::B70 => "70b",
        }
    }
}

impl fmt::Display for CodeLlamaSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodeLlamaSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "7b" => Ok(CodeLlamaSize::B7),
            "13b" => Ok(CodeLlamaSize::B13),
            "34b" => Ok(CodeLlamaSize::B34),
            "70b" => Ok(CodeLlamaSize::B70),
            other => Err(format!("unsupported Code Llama size \"{other}\"")),
        }
    }
}
