//! Coach backends
//!
//! A backend turns a [`CoachPayload`] into reply text. Two transports exist:
//! the serverless proxy route, which holds the API key server-side, and a
//! direct OpenAI-compatible call. [`FallbackCoach`] tries the proxy first and
//! falls back to the direct call when the proxy is missing (404), failing
//! (5xx), or unreachable.

use crate::coach::prompt::{ChatCompletionRequest, ChatCompletionResponse};
use crate::coach::types::{CoachPayload, CoachResponse};
use crate::config::CoachConfig;
use crate::error::CoachError;
use serde::Deserialize;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, warn};

pub type CoachFuture<'a> = Pin<Box<dyn Future<Output = Result<String, CoachError>> + Send + 'a>>;

/// Strategy for answering coach requests
pub trait CoachBackend: Send + Sync {
    fn name(&self) -> &str;

    fn ask(&self, payload: CoachPayload) -> CoachFuture<'_>;
}

fn http_client(config: &CoachConfig) -> Result<reqwest::Client, CoachError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?)
}

// ── Proxy route ──

/// Calls the serverless coach route with the raw payload
pub struct ProxyCoach {
    client: reqwest::Client,
    url: String,
}

impl ProxyCoach {
    pub fn new(url: impl Into<String>, config: &CoachConfig) -> Result<Self, CoachError> {
        Ok(Self::with_client(http_client(config)?, url))
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    async fn send(&self, payload: CoachPayload) -> Result<String, CoachError> {
        let body = payload
            .to_wire()
            .map_err(|e| CoachError::InvalidResponse(e.to_string()))?;
        let resp = self.client.post(&self.url).json(&body).send().await?;
        let status = resp.status().as_u16();

        if status == 404 || status >= 500 {
            return Err(CoachError::ProxyUnavailable { status });
        }

        if !resp.status().is_success() {
            let body: CoachResponse = resp.json().await.unwrap_or_default();
            return Err(CoachError::Api {
                status,
                message: body
                    .error
                    .unwrap_or_else(|| format!("Server error: {status}")),
            });
        }

        let body: CoachResponse = resp.json().await?;
        match (body.reply, body.error) {
            (Some(reply), _) => Ok(reply),
            (None, Some(message)) => Err(CoachError::Api { status, message }),
            (None, None) => Err(CoachError::InvalidResponse(
                "coach route returned neither reply nor error".to_string(),
            )),
        }
    }
}

impl CoachBackend for ProxyCoach {
    fn name(&self) -> &str {
        "proxy"
    }

    fn ask(&self, payload: CoachPayload) -> CoachFuture<'_> {
        Box::pin(self.send(payload))
    }
}

// ── Direct OpenAI-compatible call ──

#[derive(Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Calls the chat completions endpoint with the configured key
pub struct DirectCoach {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl DirectCoach {
    pub fn new(config: &CoachConfig) -> Result<Self, CoachError> {
        Ok(Self::with_client(http_client(config)?, config))
    }

    pub fn with_client(client: reqwest::Client, config: &CoachConfig) -> Self {
        Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    /// Call the upstream API and return the raw status on failure
    pub(crate) async fn complete(&self, payload: &CoachPayload) -> Result<String, CoachError> {
        let api_key = self.api_key.as_deref().ok_or(CoachError::MissingCredentials)?;
        let body = ChatCompletionRequest::build(payload, &self.model, self.max_tokens, self.temperature)?;

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("API error: {status}"));
            debug!(status, "chat completion failed");
            return Err(CoachError::Api { status, message });
        }

        let api: ChatCompletionResponse = resp.json().await?;
        Ok(api.reply_text())
    }
}

impl CoachBackend for DirectCoach {
    fn name(&self) -> &str {
        "openai"
    }

    fn ask(&self, payload: CoachPayload) -> CoachFuture<'_> {
        Box::pin(async move { self.complete(&payload).await })
    }
}

// ── Proxy first, direct on capability failure ──

pub struct FallbackCoach {
    primary: Box<dyn CoachBackend>,
    fallback: Box<dyn CoachBackend>,
}

impl FallbackCoach {
    pub fn new(primary: Box<dyn CoachBackend>, fallback: Box<dyn CoachBackend>) -> Self {
        Self { primary, fallback }
    }
}

impl CoachBackend for FallbackCoach {
    fn name(&self) -> &str {
        self.primary.name()
    }

    fn ask(&self, payload: CoachPayload) -> CoachFuture<'_> {
        Box::pin(async move {
            match self.primary.ask(payload.clone()).await {
                Err(e) if e.is_fallback_candidate() => {
                    warn!(
                        primary = self.primary.name(),
                        fallback = self.fallback.name(),
                        error = %e,
                        "coach backend unavailable, falling back"
                    );
                    self.fallback.ask(payload).await
                }
                other => other,
            }
        })
    }
}

/// Build the backend chain for a configuration.
///
/// With a proxy URL the chain is proxy → direct; without one it is direct only.
pub fn build_coach(config: &CoachConfig) -> Result<Box<dyn CoachBackend>, CoachError> {
    let direct: Box<dyn CoachBackend> = Box::new(DirectCoach::new(config)?);
    match config.proxy_url.as_deref().filter(|u| !u.trim().is_empty()) {
        Some(url) => {
            let proxy: Box<dyn CoachBackend> = Box::new(ProxyCoach::new(url, config)?);
            Ok(Box::new(FallbackCoach::new(proxy, direct)))
        }
        None => Ok(direct),
    }
}
