use async_trait::async_trait;
use forge404_schema::gemini::GenerationConfig;
use forge404_schema::{GenerateContentRequest, GenerateContentResponse};
use reqwest::header::{HeaderName, HeaderValue};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

use super::{GeneratedVariants, PageGenerator, extract_variants, prompt};
use crate::config::GeneratorConfig;
use crate::error::GenerationError;
use crate::utils::logging::{duration_ms, with_pretty_json_debug};

const GENERATOR_USER_AGENT: &str = concat!("forge404/", env!("CARGO_PKG_VERSION"));
const X_GOOG_API_KEY: HeaderName = HeaderName::from_static("x-goog-api-key");

/// Gemini v1beta `generateContent` client. One request per prompt, no retries.
pub struct GeminiGenerator {
    client: reqwest::Client,
    endpoint: Url,
    api_key: HeaderValue,
    model: String,
    temperature: f64,
}

impl GeminiGenerator {
    pub fn new(cfg: &GeneratorConfig) -> Result<Self, GenerationError> {
        let endpoint = cfg
            .api_base
            .join(&format!("models/{}:generateContent", cfg.model))?;

        let mut api_key = HeaderValue::from_str(cfg.api_key.trim())
            .map_err(|_| GenerationError::InvalidApiKey)?;
        api_key.set_sensitive(true);

        let mut builder = reqwest::Client::builder()
            .user_agent(GENERATOR_USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(cfg.request_timeout_secs.max(1)));

        if let Some(proxy_url) = cfg.proxy.as_ref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
            api_key,
            model: cfg.model.clone(),
            temperature: cfg.temperature,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_body(&self, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest::from_text(Some(prompt::SYSTEM_PROMPT), prompt::user_turn(prompt))
            .with_generation_config(GenerationConfig {
                temperature: Some(self.temperature.clamp(0.0, 2.0)),
                ..GenerationConfig::default()
            })
    }
}

#[async_trait]
impl PageGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<GeneratedVariants, GenerationError> {
        let body = self.request_body(prompt);
        let start = Instant::now();
        info!(
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "[Gemini] Post generateContent"
        );

        let resp = self
            .client
            .post(self.endpoint.clone())
            .header(X_GOOG_API_KEY, self.api_key.clone())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(
                model = %self.model,
                status = %status,
                elapsed_ms = duration_ms(start.elapsed()),
                "[Gemini] Upstream error"
            );
            debug!(body = %body, "[Gemini] Upstream error body");
            return Err(GenerationError::UpstreamStatus { status, body });
        }

        let bytes = resp.bytes().await?;
        let parsed: GenerateContentResponse = serde_json::from_slice(&bytes)?;
        with_pretty_json_debug(&parsed.usage_metadata, |json| {
            debug!(model = %self.model, usage = json, "[Gemini] Usage metadata");
        });

        let Some(text) = parsed.text() else {
            let reason = parsed
                .block_reason()
                .or_else(|| parsed.finish_reason())
                .map(str::to_string);
            warn!(model = %self.model, reason = ?reason, "[Gemini] Empty model response");
            return Err(GenerationError::EmptyResponse { reason });
        };

        info!(
            model = %self.model,
            text_len = text.len(),
            elapsed_ms = duration_ms(start.elapsed()),
            "[Gemini] Model response received"
        );

        extract_variants(&text).inspect_err(|err| {
            warn!(model = %self.model, error = %err, "[Gemini] Failed to parse model response");
        })
    }
}
