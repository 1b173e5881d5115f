use async_trait::async_trait;
use thiserror::Error;

/// Interface for a single-shot text completion service.
/// Implementations hold no conversation state; every call is independent.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Send one prompt and return the generated text.
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Model identifier used for requests.
    fn model_name(&self) -> &str;
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("prompt blocked: {0}")]
    Blocked(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}
