//! Coach prompt construction

use crate::coach::types::CoachPayload;
use crate::error::CoachError;
use serde::{Deserialize, Serialize};

/// Reply text used when the model answers with no content
pub const EMPTY_REPLY: &str = "No response from AI.";

pub const SYSTEM_PROMPT: &str = "You are FlowShield's Cognitive Coach for Logitech MX devices.
You ALWAYS base your answers strictly on the JSON state provided.
You help users understand why their Interaction Volatility Index (IVI) is high or low, and suggest concrete next actions.
If something is not present in the JSON, say you don't know instead of inventing details.
Be short, practical, and specific. Avoid generic productivity clichés.
You can reference: IVI score, state label, metrics like appSwitches, tabChurn, oscillations, current mode, and userProfile (role/tools).
IVI states: 0-25 = Deep Focus, 26-50 = Stable, 51-75 = Fragmented, 76-100 = Overloaded.
Keep responses concise (2-4 sentences max) and actionable.";

/// User turn: the pretty-printed state followed by the quoted question
pub fn user_content(payload: &CoachPayload) -> Result<String, CoachError> {
    let state = serde_json::to_string_pretty(&payload.state_json())
        .map_err(|e| CoachError::InvalidResponse(e.to_string()))?;
    Ok(format!(
        "Here is the current FlowShield state JSON:\n{state}\n\nThe user asked: \"{}\"\n\nAnswer as FlowShield's Cognitive Coach.",
        payload.message
    ))
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionMessage {
    pub role: &'static str,
    pub content: String,
}

/// OpenAI-compatible chat completion request body
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatCompletionMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ChatCompletionRequest {
    pub fn build(
        payload: &CoachPayload,
        model: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<Self, CoachError> {
        Ok(Self {
            model: model.to_string(),
            messages: vec![
                ChatCompletionMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatCompletionMessage {
                    role: "user",
                    content: user_content(payload)?,
                },
            ],
            max_tokens,
            temperature,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// First choice's content, or the empty-reply text
    pub fn reply_text(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_else(|| EMPTY_REPLY.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coach::types::UserProfile;

    fn payload() -> CoachPayload {
        CoachPayload {
            message: "How can I stabilize my focus right now?".to_string(),
            user_profile: UserProfile::default(),
            ivi: 62,
            state: "Fragmented".to_string(),
            metrics: Default::default(),
            mode: "None".to_string(),
            passthrough: None,
        }
    }

    #[test]
    fn test_user_content_embeds_state_and_question() {
        let content = user_content(&payload()).unwrap();
        assert!(content.starts_with("Here is the current FlowShield state JSON:\n{"));
        assert!(content.contains("\"ivi\": 62"));
        assert!(content.contains("\"state\": \"Fragmented\""));
        assert!(content.contains("The user asked: \"How can I stabilize my focus right now?\""));
        assert!(content.ends_with("Answer as FlowShield's Cognitive Coach."));
        assert!(!content.contains("\"message\""));
    }

    #[test]
    fn test_request_parameters() {
        let request = ChatCompletionRequest::build(&payload(), "gpt-4o-mini", 300, 0.7).unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 300);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
    }

    #[test]
    fn test_reply_text_fallback() {
        let response: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(response.reply_text(), EMPTY_REPLY);

        let response: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert_eq!(response.reply_text(), EMPTY_REPLY);

        let response: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": "Close Slack."}}]}"#)
                .unwrap();
        assert_eq!(response.reply_text(), "Close Slack.");
    }
}
