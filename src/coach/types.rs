//! Coach wire and transcript types
//!
//! Field names follow the coach route's JSON verbatim (camelCase).

use crate::ivi::types::{InteractionCounters, IviSnapshot};
use crate::modes::FocusMode;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request fields that make up the state embedded in the prompt
const STATE_FIELDS: [&str; 5] = ["userProfile", "ivi", "state", "metrics", "mode"];

/// Who the user is, as captured by onboarding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub role: String,
    pub tools: Vec<String>,
    pub deep_work_length_minutes: u32,
    /// "low", "medium", or "high"
    pub interruption_sensitivity: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            role: "Developer".to_string(),
            tools: vec![
                "VS Code".to_string(),
                "Browser".to_string(),
                "Slack".to_string(),
            ],
            deep_work_length_minutes: 25,
            interruption_sensitivity: "medium".to_string(),
        }
    }
}

impl UserProfile {
    /// One-line confirmation shown once the profile is saved
    pub fn summary(&self) -> String {
        let shown = self.tools.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
        let extra = if self.tools.len() > 3 {
            format!(" +{} more", self.tools.len() - 3)
        } else {
            String::new()
        };
        format!(
            "{} profile active. FlowShield is tuned for: {}{}. Sensitivity: {}.",
            self.role, shown, extra, self.interruption_sensitivity
        )
    }
}

/// Raw counters relabeled for the coach
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachMetrics {
    #[serde(rename = "appSwitchesLast10Min")]
    pub app_switches_last_10_min: u32,
    #[serde(rename = "tabChurnLast10Min")]
    pub tab_churn_last_10_min: u32,
    #[serde(rename = "oscillationsLast10Min")]
    pub oscillations_last_10_min: u32,
}

impl From<InteractionCounters> for CoachMetrics {
    fn from(counters: InteractionCounters) -> Self {
        Self {
            app_switches_last_10_min: counters.app_switches,
            tab_churn_last_10_min: counters.tab_churn,
            oscillations_last_10_min: counters.oscillations,
        }
    }
}

/// Request body of the coach route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachPayload {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_profile: UserProfile,
    #[serde(default)]
    pub ivi: u8,
    /// State label, e.g. "Deep Focus"
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub metrics: CoachMetrics,
    /// Mode label, e.g. "Deep Work 25m" or "None"
    #[serde(default)]
    pub mode: String,
    /// State fields exactly as a route caller sent them
    #[serde(skip)]
    pub passthrough: Option<Value>,
}

fn lenient<T: DeserializeOwned + Default>(body: &Value, key: &str) -> T {
    body.get(key)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

impl CoachPayload {
    /// Build a payload from a published snapshot
    pub fn from_snapshot(
        message: impl Into<String>,
        profile: &UserProfile,
        snapshot: &IviSnapshot,
        mode: FocusMode,
    ) -> Self {
        Self {
            message: message.into(),
            user_profile: profile.clone(),
            ivi: snapshot.score,
            state: snapshot.state.label().to_string(),
            metrics: snapshot.counters.into(),
            mode: mode.label().to_string(),
            passthrough: None,
        }
    }

    /// Parse a coach route body.
    ///
    /// Only a non-empty string `message` is required. The state fields are
    /// kept as received for the prompt; the typed fields take what fits and
    /// default the rest.
    pub fn from_request(body: &str) -> Option<Self> {
        let body: Value = serde_json::from_str(body).ok()?;
        let message = body
            .get("message")?
            .as_str()
            .filter(|m| !m.is_empty())?
            .to_string();

        let state: Map<String, Value> = STATE_FIELDS
            .iter()
            .filter_map(|key| body.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect();

        Some(Self {
            message,
            user_profile: lenient(&body, "userProfile"),
            ivi: lenient(&body, "ivi"),
            state: lenient(&body, "state"),
            metrics: lenient(&body, "metrics"),
            mode: lenient(&body, "mode"),
            passthrough: Some(Value::Object(state)),
        })
    }

    /// Request body sent to the coach route
    pub fn to_wire(&self) -> Result<Value, serde_json::Error> {
        let Some(mut wire) = self.passthrough.clone() else {
            return serde_json::to_value(self);
        };
        if let Value::Object(map) = &mut wire {
            map.insert("message".to_string(), Value::String(self.message.clone()));
        }
        Ok(wire)
    }

    /// The state object embedded in the prompt (everything except the message)
    pub fn state_json(&self) -> Value {
        if let Some(raw) = &self.passthrough {
            return raw.clone();
        }
        serde_json::json!({
            "userProfile": self.user_profile,
            "ivi": self.ivi,
            "state": self.state,
            "metrics": self.metrics,
            "mode": self.mode,
        })
    }
}

/// Response body of the coach route: exactly one of `reply` or `error`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CoachResponse {
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            reply: Some(text.into()),
            error: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            reply: None,
            error: Some(text.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ivi::types::IviState;
    use pretty_assertions::assert_eq;

    fn snapshot() -> IviSnapshot {
        IviSnapshot {
            session_id: "s-1".to_string(),
            score: 48,
            state: IviState::Stable,
            history: Vec::new(),
            counters: InteractionCounters::new(12, 8, 4),
            ticks: 3,
            burst_active: false,
        }
    }

    #[test]
    fn test_payload_wire_names() {
        let payload = CoachPayload::from_snapshot(
            "Why is my IVI high?",
            &UserProfile::default(),
            &snapshot(),
            FocusMode::Deep25,
        );
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["message"], "Why is my IVI high?");
        assert_eq!(json["ivi"], 48);
        assert_eq!(json["state"], "Stable");
        assert_eq!(json["mode"], "Deep Work 25m");
        assert_eq!(json["metrics"]["appSwitchesLast10Min"], 12);
        assert_eq!(json["metrics"]["tabChurnLast10Min"], 8);
        assert_eq!(json["metrics"]["oscillationsLast10Min"], 4);
        assert_eq!(json["userProfile"]["deepWorkLengthMinutes"], 25);
        assert_eq!(json["userProfile"]["interruptionSensitivity"], "medium");
    }

    #[test]
    fn test_state_json_omits_message() {
        let payload =
            CoachPayload::from_snapshot("hi", &UserProfile::default(), &snapshot(), FocusMode::None);
        let state = payload.state_json();
        assert!(state.get("message").is_none());
        assert_eq!(state["mode"], "None");
    }

    #[test]
    fn test_payload_without_message_parses() {
        let payload: CoachPayload = serde_json::from_str(r#"{"ivi": 10}"#).unwrap();
        assert!(payload.message.is_empty());
        assert_eq!(payload.user_profile, UserProfile::default());
    }

    #[test]
    fn test_request_requires_only_message() {
        for body in [
            r#"{"message": "hi", "ivi": 42.5}"#,
            r#"{"message": "hi", "userProfile": null}"#,
            r#"{"message": "hi", "metrics": {"appSwitchesLast10Min": -1}}"#,
            r#"{"message": "hi", "ivi": 150}"#,
        ] {
            let payload = CoachPayload::from_request(body).unwrap();
            assert_eq!(payload.message, "hi");
        }

        for body in [r#"{"ivi": 10}"#, r#"{"message": ""}"#, r#"{"message": 5}"#, "not json"] {
            assert!(CoachPayload::from_request(body).is_none());
        }
    }

    #[test]
    fn test_request_state_passes_through() {
        let payload = CoachPayload::from_request(
            r#"{"message": "hi", "ivi": 42.5, "metrics": {"appSwitchesLast10Min": -1}, "extra": true}"#,
        )
        .unwrap();
        assert_eq!(payload.ivi, 0);
        assert_eq!(payload.metrics, CoachMetrics::default());

        let state = payload.state_json();
        assert_eq!(state["ivi"], 42.5);
        assert_eq!(state["metrics"]["appSwitchesLast10Min"], -1);
        assert!(state.get("extra").is_none());
        assert!(state.get("mode").is_none());

        let wire = payload.to_wire().unwrap();
        assert_eq!(wire["message"], "hi");
        assert_eq!(wire["ivi"], 42.5);
    }

    #[test]
    fn test_profile_summary() {
        let mut profile = UserProfile::default();
        assert_eq!(
            profile.summary(),
            "Developer profile active. FlowShield is tuned for: VS Code, Browser, Slack. Sensitivity: medium."
        );

        profile.tools.push("Figma".to_string());
        profile.tools.push("Notion".to_string());
        assert!(profile.summary().contains("VS Code, Browser, Slack +2 more."));
    }

    #[test]
    fn test_response_shape() {
        let json = serde_json::to_string(&CoachResponse::reply("ok")).unwrap();
        assert_eq!(json, r#"{"reply":"ok"}"#);
        let json = serde_json::to_string(&CoachResponse::error("bad")).unwrap();
        assert_eq!(json, r#"{"error":"bad"}"#);
    }
}
