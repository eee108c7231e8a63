//! Simulated interaction events

use serde::{Deserialize, Serialize};

/// Interaction event types observed by the aggregation loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionEvent {
    AppSwitch,
    TabChurn,
    Oscillation,
}

/// Which scripted burst is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BurstKind {
    Chaos,
    Focus,
}

impl BurstKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BurstKind::Chaos => "chaos",
            BurstKind::Focus => "focus",
        }
    }
}

/// Tracks the foreground app and flags returns to the previous one.
///
/// Every change of app is an app switch; switching straight back to the app
/// that was left last time is additionally an oscillation.
#[derive(Debug, Clone, Default)]
pub struct AppSwitchTracker {
    active: Option<String>,
    previous: Option<String>,
}

impl AppSwitchTracker {
    pub fn new(initial_app: impl Into<String>) -> Self {
        Self {
            active: Some(initial_app.into()),
            previous: None,
        }
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Focus `app`, returning the events this transition produces.
    pub fn focus(&mut self, app: &str) -> Vec<InteractionEvent> {
        if self.active.as_deref() == Some(app) {
            return Vec::new();
        }

        let mut events = vec![InteractionEvent::AppSwitch];
        if self.previous.as_deref() == Some(app) {
            events.push(InteractionEvent::Oscillation);
        }

        self.previous = self.active.take();
        self.active = Some(app.to_string());
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&InteractionEvent::TabChurn).unwrap();
        assert_eq!(json, "\"tab_churn\"");

        let parsed: BurstKind = serde_json::from_str("\"focus\"").unwrap();
        assert_eq!(parsed, BurstKind::Focus);
    }

    #[test]
    fn test_same_app_is_not_a_switch() {
        let mut tracker = AppSwitchTracker::new("VS Code");
        assert!(tracker.focus("VS Code").is_empty());
    }

    #[test]
    fn test_return_to_previous_app_oscillates() {
        let mut tracker = AppSwitchTracker::new("VS Code");
        assert_eq!(tracker.focus("Browser"), vec![InteractionEvent::AppSwitch]);
        assert_eq!(
            tracker.focus("VS Code"),
            vec![InteractionEvent::AppSwitch, InteractionEvent::Oscillation]
        );
        assert_eq!(tracker.focus("Slack"), vec![InteractionEvent::AppSwitch]);
        assert_eq!(tracker.active(), Some("Slack"));
    }
}
