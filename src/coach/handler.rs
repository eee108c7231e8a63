//! Server-side coach route
//!
//! Transport-agnostic: the caller supplies the HTTP method and raw body and
//! writes back the returned status and JSON.

use crate::coach::backend::{CoachBackend, DirectCoach};
use crate::coach::types::{CoachPayload, CoachResponse};
use crate::config::CoachConfig;
use crate::error::CoachError;
use serde::Serialize;
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerResponse {
    pub status: u16,
    pub body: CoachResponse,
}

impl HandlerResponse {
    fn ok(reply: String) -> Self {
        Self {
            status: 200,
            body: CoachResponse::reply(reply),
        }
    }

    fn fail(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: CoachResponse::error(message),
        }
    }
}

pub struct CoachHandler {
    upstream: Box<dyn CoachBackend>,
    has_credentials: bool,
}

impl CoachHandler {
    pub fn new(config: &CoachConfig) -> Result<Self, CoachError> {
        let has_credentials = config
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        Ok(Self {
            upstream: Box::new(DirectCoach::new(config)?),
            has_credentials,
        })
    }

    /// Use a custom upstream backend
    pub fn with_backend(upstream: Box<dyn CoachBackend>, has_credentials: bool) -> Self {
        Self {
            upstream,
            has_credentials,
        }
    }

    pub async fn handle(&self, method: &str, body: &str) -> HandlerResponse {
        if !method.eq_ignore_ascii_case("POST") {
            return HandlerResponse::fail(405, "Method not allowed");
        }

        if !self.has_credentials {
            error!("OPENAI_API_KEY is not set");
            return HandlerResponse::fail(
                500,
                "Server configuration error: OPENAI_API_KEY not set.",
            );
        }

        let Some(payload) = CoachPayload::from_request(body) else {
            return HandlerResponse::fail(400, "Missing required field: message");
        };

        match self.upstream.ask(payload).await {
            Ok(reply) => HandlerResponse::ok(reply),
            Err(CoachError::Api { status, message }) => {
                error!(status, %message, "upstream API error");
                HandlerResponse::fail(500, format!("OpenAI error: {status}"))
            }
            Err(e) => {
                error!(error = %e, "error calling upstream API");
                HandlerResponse::fail(500, "AI error. Please try again.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coach::backend::tests::{MockCoach, Scripted};
    use pretty_assertions::assert_eq;

    const BODY: &str = r#"{"message": "Why is my IVI high?", "ivi": 72, "state": "Fragmented"}"#;

    fn handler(outcome: Scripted) -> CoachHandler {
        CoachHandler::with_backend(Box::new(MockCoach::new(outcome)), true)
    }

    #[tokio::test]
    async fn test_rejects_non_post() {
        let response = handler(Scripted::Reply("x")).handle("GET", BODY).await;
        assert_eq!(response, HandlerResponse::fail(405, "Method not allowed"));
    }

    #[tokio::test]
    async fn test_missing_key_is_config_error() {
        let handler = CoachHandler::new(&CoachConfig::default()).unwrap();
        let response = handler.handle("POST", BODY).await;
        assert_eq!(response.status, 500);
        assert_eq!(
            response.body.error.as_deref(),
            Some("Server configuration error: OPENAI_API_KEY not set.")
        );
    }

    #[tokio::test]
    async fn test_missing_message() {
        let handler = handler(Scripted::Reply("x"));
        for body in [r#"{"ivi": 10}"#, r#"{"message": ""}"#, "not json"] {
            let response = handler.handle("POST", body).await;
            assert_eq!(
                response,
                HandlerResponse::fail(400, "Missing required field: message")
            );
        }
    }

    #[tokio::test]
    async fn test_loosely_typed_fields_are_accepted() {
        let handler = handler(Scripted::Reply("ok"));
        for body in [
            r#"{"message": "hi", "ivi": 42.5}"#,
            r#"{"message": "hi", "userProfile": null}"#,
            r#"{"message": "hi", "metrics": {"appSwitchesLast10Min": -1}}"#,
            r#"{"message": "hi", "ivi": 150}"#,
        ] {
            let response = handler.handle("POST", body).await;
            assert_eq!(response, HandlerResponse::ok("ok".to_string()), "body: {body}");
        }
    }

    #[tokio::test]
    async fn test_success_returns_reply() {
        let response = handler(Scripted::Reply("Mute Slack.")).handle("post", BODY).await;
        assert_eq!(response, HandlerResponse::ok("Mute Slack.".to_string()));
    }

    #[tokio::test]
    async fn test_upstream_errors_are_masked() {
        let response = handler(Scripted::Api("quota exceeded")).handle("POST", BODY).await;
        assert_eq!(response, HandlerResponse::fail(500, "OpenAI error: 400"));

        let response = handler(Scripted::ProxyDown(503)).handle("POST", BODY).await;
        assert_eq!(response, HandlerResponse::fail(500, "AI error. Please try again."));
    }
}
