use serde::{Deserialize, Serialize};
use url::Url;

/// Generation service configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratorConfig {
    /// API key for the Gemini REST API (required, non-empty).
    /// Env: `GEMINI_API_KEY`. TOML: `generation.api_key`.
    #[serde(default)]
    pub api_key: String,

    /// Model used for page generation.
    /// TOML: `generation.model`. Default: `gemini-2.0-flash`.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base of the v1beta API; `models/{model}:generateContent` is joined onto it.
    /// TOML: `generation.api_base`. Default: `https://generativelanguage.googleapis.com/v1beta/`.
    #[serde(default = "default_api_base")]
    pub api_base: Url,

    /// Optional upstream HTTP proxy. If set, used for the reqwest client.
    /// TOML: `generation.proxy`. Example: `http://127.0.0.1:1080`.
    #[serde(default)]
    pub proxy: Option<Url>,

    /// Overall deadline for one generation call, in seconds.
    /// TOML: `generation.request_timeout_secs`. Default: `120`.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Sampling temperature forwarded to the model.
    /// TOML: `generation.temperature`. Default: `1.0`.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Longest prompt accepted, counted in characters after trimming.
    /// TOML: `generation.max_prompt_chars`. Default: `2000`.
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            // No default. `Config::validate()` enforces non-empty.
            api_key: String::new(),
            model: default_model(),
            api_base: default_api_base(),
            proxy: None,
            request_timeout_secs: default_request_timeout_secs(),
            temperature: default_temperature(),
            max_prompt_chars: default_max_prompt_chars(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_api_base() -> Url {
    Url::parse("https://generativelanguage.googleapis.com/v1beta/").expect("valid Gemini API base")
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_temperature() -> f64 {
    1.0
}

fn default_max_prompt_chars() -> usize {
    2000
}
