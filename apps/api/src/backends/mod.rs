//! Text-generation backends.
//!
//! ARCHITECTURAL RULE: No other module may call a model provider directly.
//! Every generation goes through `BackendRouter`, which owns the fallback chain.
//!
//! Backends are constructed once at startup and injected as `Arc<dyn GenerationBackend>`.

use async_trait::async_trait;
use thiserror::Error;

pub mod anthropic;
pub mod local;
pub mod openai;
pub mod router;

pub use router::BackendRouter;

/// Parameters for a single generation call.
#[derive(Debug, Clone)]
pub struct GenerationParams<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Backend returned empty content")]
    EmptyContent,

    #[error("Backend timed out after {0}s")]
    Timeout(u64),
}

/// A text-generation provider. One call is one attempt; implementations must not retry.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Stable identifier used in routing hints, logs, and the persisted record.
    fn id(&self) -> &str;

    async fn generate(&self, params: &GenerationParams<'_>) -> Result<String, BackendError>;
}
