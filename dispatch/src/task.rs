/// A raw composite prompt submitted for classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptRequest {
    /// The unsplit prompt document.
    pub prompt: String,
    /// Whether the rules section is passed to the model.
    pub include_rules: bool,
}

impl PromptRequest {
    /// Create a new request that keeps the rules.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), include_rules: true }
    }

    /// Choose whether the rules section is sent to the model.
    pub fn include_rules(mut self, value: bool) -> Self {
        self.include_rules = value;
        self
    }
}

impl From<String> for PromptRequest {
    fn from(prompt: String) -> Self {
        Self::new(prompt)
    }
}

impl From<&str> for PromptRequest {
    fn from(prompt: &str) -> Self {
        Self::new(prompt)
    }
}
