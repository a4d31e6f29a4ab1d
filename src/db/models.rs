use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{ForgeError, GenerationError};

/// A persisted prompt together with its two generated artifacts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPage {
    pub id: String,
    pub prompt: String,
    /// Static HTML+CSS rendition.
    pub html_version: String,
    /// Next.js component rendition.
    pub nextjs_version: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload. `id` and `created_at` are assigned by the store.
///
/// Construction enforces that nothing empty ever reaches the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPage {
    prompt: String,
    html_version: String,
    nextjs_version: String,
}

impl NewPage {
    pub fn new(
        prompt: &str,
        html_version: String,
        nextjs_version: String,
    ) -> Result<Self, ForgeError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ForgeError::ValidationFailed(
                "Prompt must be a non-empty string".to_string(),
            ));
        }
        if html_version.trim().is_empty() {
            return Err(GenerationError::MissingSection("HTML_VERSION").into());
        }
        if nextjs_version.trim().is_empty() {
            return Err(GenerationError::MissingSection("NEXTJS_VERSION").into());
        }
        Ok(Self {
            prompt: prompt.to_string(),
            html_version,
            nextjs_version,
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn html_version(&self) -> &str {
        &self.html_version
    }

    pub fn nextjs_version(&self) -> &str {
        &self.nextjs_version
    }
}
