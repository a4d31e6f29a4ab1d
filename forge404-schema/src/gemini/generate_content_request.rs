//! Typed Gemini v1beta `generateContent` request body.
//!
//! Only the fields the page generator sends are modeled explicitly; anything
//! else rides along in the `extra` catch-all so callers can still set
//! `safetySettings` and friends without a schema change.

mod content;
mod generation;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub use content::{Content, Part};
pub use generation::GenerationConfig;

/// Reference: <https://ai.google.dev/api/generate-content>
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Required conversation turns.
    pub contents: Vec<Content>,

    /// System-level instruction; a `Content` without a `role`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,

    #[serde(default, flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl GenerateContentRequest {
    /// Single-turn text request with an optional system instruction.
    pub fn from_text(system_instruction: Option<&str>, user_text: impl Into<String>) -> Self {
        Self {
            contents: vec![Content::user_text(user_text)],
            system_instruction: system_instruction
                .filter(|text| !text.trim().is_empty())
                .map(Content::system_text),
            generation_config: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }
}
