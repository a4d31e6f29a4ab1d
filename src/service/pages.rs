use std::sync::Arc;
use tracing::{debug, info};

use crate::db::{GeneratedPage, HealthReport, NewPage, PageStore};
use crate::error::ForgeError;
use crate::generation::PageGenerator;
use crate::utils::logging::preview;

/// Request-level operations: validate, generate, persist.
#[derive(Clone)]
pub struct PageService {
    store: PageStore,
    generator: Arc<dyn PageGenerator>,
    max_prompt_chars: usize,
}

impl PageService {
    pub fn new(
        store: PageStore,
        generator: Arc<dyn PageGenerator>,
        max_prompt_chars: usize,
    ) -> Self {
        Self {
            store,
            generator,
            max_prompt_chars,
        }
    }

    pub fn store(&self) -> &PageStore {
        &self.store
    }

    /// Validates the prompt before any I/O, generates both artifacts and
    /// stores them. Nothing is written unless generation fully succeeded.
    pub async fn create_page(&self, prompt: &str) -> Result<GeneratedPage, ForgeError> {
        let prompt = self.validate_prompt(prompt)?;
        info!(prompt = %preview(prompt, 100), "Generating 404 page");
        let variants = self.generator.generate(prompt).await?;
        debug!(
            html_len = variants.html_version.len(),
            nextjs_len = variants.nextjs_version.len(),
            "Generated both page variants"
        );

        let page = NewPage::new(prompt, variants.html_version, variants.nextjs_version)?;
        let saved = self.store.insert(page).await?;
        info!(page.id = %saved.id, "Stored generated 404 page");
        Ok(saved)
    }

    pub async fn list_pages(&self, limit: Option<u32>) -> Result<Vec<GeneratedPage>, ForgeError> {
        self.store.list_all(limit).await
    }

    pub async fn find_page(&self, id: &str) -> Result<GeneratedPage, ForgeError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ForgeError::NotFound(id.to_string()))
    }

    /// Returns how many pages were removed (0 or 1).
    pub async fn delete_page(&self, id: &str) -> Result<u64, ForgeError> {
        let deleted = self.store.delete_by_id(id).await?;
        info!(page.id = %id, deleted, "Delete page requested");
        Ok(deleted)
    }

    pub async fn health(&self) -> HealthReport {
        self.store.health_check().await
    }

    fn validate_prompt<'a>(&self, prompt: &'a str) -> Result<&'a str, ForgeError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ForgeError::ValidationFailed(
                "Prompt must be a non-empty string".to_string(),
            ));
        }
        if prompt.chars().count() > self.max_prompt_chars {
            return Err(ForgeError::ValidationFailed(format!(
                "Prompt must be at most {} characters",
                self.max_prompt_chars
            )));
        }
        Ok(prompt)
    }
}
