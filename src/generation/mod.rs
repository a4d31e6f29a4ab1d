//! Prompt to artifacts: one model call, then extraction of the HTML and
//! Next.js sections.

mod extract;
mod gemini;
mod prompt;

pub use extract::extract_variants;
pub use gemini::GeminiGenerator;
pub use prompt::{SYSTEM_PROMPT, user_turn};

use async_trait::async_trait;

use crate::error::GenerationError;

/// The two artifacts produced for one prompt, both non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVariants {
    pub html_version: String,
    pub nextjs_version: String,
}

#[async_trait]
pub trait PageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedVariants, GenerationError>;
}
