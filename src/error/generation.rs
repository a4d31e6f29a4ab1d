use reqwest::StatusCode;
use thiserror::Error as ThisError;

/// Failure of the generation service: the model call itself, or a response
/// that does not contain the two expected artifacts.
#[derive(Debug, ThisError)]
pub enum GenerationError {
    /// Transport-level failure (DNS, connect, timeouts, etc).
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-2xx answer. The body is kept for internal diagnostics only.
    #[error("Upstream error with status: {status}")]
    UpstreamStatus { status: StatusCode, body: String },

    #[error("failed to decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    /// `reason` carries the block or finish reason when the model gave one.
    #[error("model returned no usable text")]
    EmptyResponse { reason: Option<String> },

    #[error("model response is missing the {0} section")]
    MissingSection(&'static str),

    #[error("API key is not a valid header value")]
    InvalidApiKey,

    #[error("invalid generation endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

impl GenerationError {
    /// True when the model answered but the answer could not be used.
    pub fn is_incomplete(&self) -> bool {
        matches!(
            self,
            GenerationError::EmptyResponse { .. } | GenerationError::MissingSection(_)
        )
    }
}
