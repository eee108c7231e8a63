//! Error types for FlowShield

use thiserror::Error;

/// Errors surfaced by configuration loading, script parsing, and the CLI glue.
///
/// The scoring core and the aggregation loop are total and never produce these.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid simulation script: {0}")]
    InvalidScript(String),

    #[error("Unknown focus mode: {0}")]
    UnknownMode(String),

    #[error("Coach error: {0}")]
    Coach(#[from] CoachError),
}

/// Errors at the coach (language-model) boundary.
#[derive(Debug, Error)]
pub enum CoachError {
    /// No API key is available; reported once, never retried.
    #[error("OpenAI API key not configured. Set OPENAI_API_KEY in the environment.")]
    MissingCredentials,

    /// The proxy route does not exist or failed server-side; callers may fall back.
    #[error("Coach proxy unavailable (status {status})")]
    ProxyUnavailable { status: u16 },

    /// The proxy or upstream API answered with a client-visible error.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Network error. Please check your connection.")]
    Network(#[from] reqwest::Error),

    #[error("Invalid coach response: {0}")]
    InvalidResponse(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

impl CoachError {
    /// Whether a proxy-first strategy should retry this failure against the direct backend.
    pub fn is_fallback_candidate(&self) -> bool {
        matches!(
            self,
            CoachError::ProxyUnavailable { .. } | CoachError::Network(_)
        )
    }
}
