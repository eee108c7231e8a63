//! Voice command interpretation
//!
//! Speech recognition itself is external; this module receives the recognized
//! utterance and maps it to a canned action by keyword matching. Groups are
//! checked in a fixed order and the first match wins.

use crate::modes::FocusMode;
use serde::Serialize;
use tracing::warn;

/// Recognized intent of an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum VoiceIntent {
    DeepWork { minutes: u32 },
    Stop,
    DoNotDisturb,
    Collaboration,
    Break,
    Unrecognized,
}

impl VoiceIntent {
    /// Mode change the intent implies, if any
    pub fn mode_effect(&self) -> Option<FocusMode> {
        match self {
            VoiceIntent::DeepWork { minutes } => Some(FocusMode::deep_work(*minutes)),
            VoiceIntent::Stop => Some(FocusMode::None),
            VoiceIntent::Collaboration => Some(FocusMode::Collaboration),
            _ => None,
        }
    }
}

/// An interpreted utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceCommand {
    /// Lowercased utterance
    pub transcript: String,
    pub intent: VoiceIntent,
    /// Action description shown to the user
    pub action: String,
}

const DEEP_WORK_KEYWORDS: &[&str] = &["deep work", "focus"];
const STOP_KEYWORDS: &[&str] = &["stop", "exit", "cancel"];
const DND_KEYWORDS: &[&str] = &["mute", "do not disturb", "dnd"];
const COLLABORATION_KEYWORDS: &[&str] = &["collaboration", "meeting"];
const BREAK_KEYWORDS: &[&str] = &["break", "rest"];

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Map an utterance to its intent
pub fn classify_utterance(text: &str) -> VoiceIntent {
    if contains_any(text, DEEP_WORK_KEYWORDS) {
        let minutes = if text.contains("90") {
            90
        } else if text.contains("45") {
            45
        } else {
            25
        };
        VoiceIntent::DeepWork { minutes }
    } else if contains_any(text, STOP_KEYWORDS) {
        VoiceIntent::Stop
    } else if contains_any(text, DND_KEYWORDS) {
        VoiceIntent::DoNotDisturb
    } else if contains_any(text, COLLABORATION_KEYWORDS) {
        VoiceIntent::Collaboration
    } else if contains_any(text, BREAK_KEYWORDS) {
        VoiceIntent::Break
    } else {
        VoiceIntent::Unrecognized
    }
}

fn action_for(intent: VoiceIntent) -> String {
    match intent {
        VoiceIntent::DeepWork { minutes } => {
            format!("Deep Work {minutes}m mode started. MX remapped to Focus Lock.")
        }
        VoiceIntent::Stop => "Focus mode stopped. Returning to default mode.".to_string(),
        VoiceIntent::DoNotDisturb => "Do Not Disturb enabled. Notifications snoozed.".to_string(),
        VoiceIntent::Collaboration => {
            "Collaboration mode activated. MX optimized for team work.".to_string()
        }
        VoiceIntent::Break => {
            "10-minute reset break scheduled. Scroll resistance increased.".to_string()
        }
        VoiceIntent::Unrecognized => {
            "Tip: Try \"start deep work\", \"stop\", \"mute notifications\", or \"collaboration mode\"."
                .to_string()
        }
    }
}

/// Interpret a recognized utterance
pub fn interpret(utterance: &str) -> VoiceCommand {
    let transcript = utterance.trim().to_lowercase();
    let intent = classify_utterance(&transcript);
    VoiceCommand {
        action: action_for(intent),
        transcript,
        intent,
    }
}

/// Availability of the speech source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceStatus {
    Available,
    Unsupported,
}

/// Gate around the interpreter for environments without speech recognition
#[derive(Debug, Clone)]
pub struct VoiceControl {
    status: VoiceStatus,
    reported: bool,
}

impl VoiceControl {
    pub fn new(supported: bool) -> Self {
        Self {
            status: if supported {
                VoiceStatus::Available
            } else {
                VoiceStatus::Unsupported
            },
            reported: false,
        }
    }

    pub fn status(&self) -> VoiceStatus {
        self.status
    }

    /// Interpret an utterance, or `None` when voice is unsupported.
    ///
    /// The unsupported state is logged on the first call only.
    pub fn handle(&mut self, utterance: &str) -> Option<VoiceCommand> {
        if self.status == VoiceStatus::Unsupported {
            if !self.reported {
                warn!("voice control not supported in this environment");
                self.reported = true;
            }
            return None;
        }
        Some(interpret(utterance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_work_lengths() {
        assert_eq!(interpret("Start deep work").intent, VoiceIntent::DeepWork { minutes: 25 });
        assert_eq!(
            interpret("focus for 90 minutes").intent,
            VoiceIntent::DeepWork { minutes: 90 }
        );
        assert_eq!(
            interpret("deep work 45").action,
            "Deep Work 45m mode started. MX remapped to Focus Lock."
        );
    }

    #[test]
    fn test_first_group_wins() {
        // "stop" appears but the deep-work group is checked first
        assert_eq!(
            interpret("stop distractions and focus").intent,
            VoiceIntent::DeepWork { minutes: 25 }
        );
        // "mute" beats "meeting"
        assert_eq!(interpret("mute the meeting").intent, VoiceIntent::DoNotDisturb);
        // "rest" is a substring of "interested" and matches the break group
        assert_eq!(interpret("interested").intent, VoiceIntent::Break);
    }

    #[test]
    fn test_each_group() {
        assert_eq!(interpret("cancel").intent, VoiceIntent::Stop);
        assert_eq!(interpret("enable DND").intent, VoiceIntent::DoNotDisturb);
        assert_eq!(interpret("collaboration mode").intent, VoiceIntent::Collaboration);
        assert_eq!(interpret("take a break").intent, VoiceIntent::Break);
    }

    #[test]
    fn test_every_stop_keyword_clears_mode() {
        for text in ["stop", "exit now", "cancel that"] {
            assert_eq!(interpret(text).intent.mode_effect(), Some(FocusMode::None), "{text}");
        }
    }

    #[test]
    fn test_unrecognized_returns_tip() {
        let command = interpret("hello there");
        assert_eq!(command.intent, VoiceIntent::Unrecognized);
        assert!(command.action.starts_with("Tip:"));
        assert_eq!(command.intent.mode_effect(), None);
    }

    #[test]
    fn test_mode_effects() {
        assert_eq!(
            VoiceIntent::DeepWork { minutes: 45 }.mode_effect(),
            Some(FocusMode::Deep45)
        );
        assert_eq!(VoiceIntent::Stop.mode_effect(), Some(FocusMode::None));
        assert_eq!(VoiceIntent::Collaboration.mode_effect(), Some(FocusMode::Collaboration));
        assert_eq!(VoiceIntent::Break.mode_effect(), None);
    }

    #[test]
    fn test_unsupported_voice_is_disabled() {
        let mut voice = VoiceControl::new(false);
        assert_eq!(voice.status(), VoiceStatus::Unsupported);
        assert!(voice.handle("start deep work").is_none());
        assert!(voice.handle("stop").is_none());

        let mut voice = VoiceControl::new(true);
        assert!(voice.handle("stop").is_some());
    }
}
