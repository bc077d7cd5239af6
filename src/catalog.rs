use serde::{Deserialize, Serialize};

use crate::error::SummaryError;

/// A selectable inference target. `content` is the identifier sent to the
/// completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub content: String,
}

/// A selectable instruction template. `content` is sent verbatim as the
/// system instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub name: String,
    pub content: String,
}

impl Model {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

impl Prompt {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Ordered model and prompt lists. Both are non-empty; index 0 is the default.
#[derive(Debug, Clone)]
pub struct Catalog {
    models: Vec<Model>,
    prompts: Vec<Prompt>,
}

impl Catalog {
    pub fn new(models: Vec<Model>, prompts: Vec<Prompt>) -> Result<Self, SummaryError> {
        if models.is_empty() {
            return Err(SummaryError::EmptyCatalog("model"));
        }
        if prompts.is_empty() {
            return Err(SummaryError::EmptyCatalog("prompt"));
        }
        Ok(Self { models, prompts })
    }

    pub fn builtin() -> Self {
        Self {
            models: builtin_models(),
            prompts: builtin_prompts(),
        }
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn default_model(&self) -> &Model {
        &self.models[0]
    }

    pub fn default_prompt(&self) -> &Prompt {
        &self.prompts[0]
    }

    pub fn model(&self, index: usize) -> Option<&Model> {
        self.models.get(index)
    }

    pub fn prompt(&self, index: usize) -> Option<&Prompt> {
        self.prompts.get(index)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_models() -> Vec<Model> {
    vec![
        Model::new("Claude Haiku 4.5", "claude-haiku-4-5"),
        Model::new("Claude Sonnet 4.5", "claude-sonnet-4-5-20250929"),
        Model::new("GPT-4o mini", "gpt-4o-mini"),
        Model::new("GPT-4o", "gpt-4o"),
    ]
}

fn builtin_prompts() -> Vec<Prompt> {
    vec![
        Prompt::new(
            "Summary",
            "Summarize the following content in a few short paragraphs. \
             Keep the key points and leave out filler.",
        ),
        Prompt::new(
            "Key points",
            "List the key points of the following content as concise bullet points.",
        ),
        Prompt::new(
            "Explain simply",
            "Explain the following content in plain language for someone new to the topic.",
        ),
    ]
}
