//! Recommendation and advisory policy
//!
//! Declarative rules over `(state, score, mode, transition edge)`. Nothing here
//! mutates the counters; the output is display data only.

use crate::config::PolicyConfig;
use crate::ivi::mapping::{device_profile, DeviceProfile};
use crate::ivi::types::IviState;
use crate::modes::FocusMode;
use serde::Serialize;
use tracing::info;

/// Canned recommendation for a state
pub fn recommendation(state: IviState) -> &'static str {
    match state {
        IviState::DeepFocus => "✓ Stay in current mode, you're in the zone!",
        IviState::Stable => "💡 Good time to start a focus block",
        IviState::Fragmented => "⚡ Start 25-min deep work to stabilize",
        IviState::Overloaded => "🚨 Immediate 25-min reset recommended",
    }
}

/// A condition → action automation rule shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AutomationRule {
    pub condition: &'static str,
    pub action: &'static str,
}

pub const AUTOMATION_RULES: [AutomationRule; 5] = [
    AutomationRule {
        condition: "IF IVI > 70 for 3 minutes",
        action: "Auto-start 25-min Deep Work Mode & remap MX to Focus Lock profile",
    },
    AutomationRule {
        condition: "IF IVI < 30 for 15 minutes",
        action: "Suggest a 5-min micro-break to preserve long-term focus reserves",
    },
    AutomationRule {
        condition: "IF app-switch spikes from Slack/Chat",
        action: "Temporarily remap thumb button to 'Back to Primary App'",
    },
    AutomationRule {
        condition: "IF Overloaded state persists > 5 min",
        action: "Remap gesture-down to 'Lock Screen' and enable aggressive DND",
    },
    AutomationRule {
        condition: "IF entering Deep Work Mode manually",
        action: "Immediately switch to Focus Lock MX profile regardless of current IVI",
    },
];

/// Banner raised when volatility spikes during deep work
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpikeAlert {
    pub score: u8,
    pub mode: FocusMode,
    pub raised_at_ms: u64,
    pub expires_at_ms: u64,
}

impl SpikeAlert {
    pub fn title(&self) -> &'static str {
        "Volatility spike during Deep Work!"
    }

    pub fn detail(&self) -> String {
        format!(
            "Your IVI just hit {}. Suggestion: Lock to 2 apps only and snooze notifications.",
            self.score
        )
    }
}

/// Edge-triggered spike detection.
///
/// Fires when a deep-work mode is active and the score rises above the
/// threshold from at or below it. The previous score is updated on every
/// observation regardless of mode.
#[derive(Debug, Clone)]
pub struct SpikeDetector {
    threshold: u8,
    alert_ms: u64,
    previous_score: u8,
    alert: Option<SpikeAlert>,
}

impl Default for SpikeDetector {
    fn default() -> Self {
        Self::new(&PolicyConfig::default())
    }
}

impl SpikeDetector {
    pub fn new(config: &PolicyConfig) -> Self {
        Self {
            threshold: config.spike_threshold,
            alert_ms: config.spike_alert_ms,
            previous_score: 0,
            alert: None,
        }
    }

    /// Feed a newly published score. Returns the alert if this observation raised one.
    pub fn observe(&mut self, score: u8, mode: FocusMode, now_ms: u64) -> Option<SpikeAlert> {
        let crossed = score > self.threshold && self.previous_score <= self.threshold;
        self.previous_score = score;

        if !(crossed && mode.is_deep_work()) {
            return None;
        }

        let alert = SpikeAlert {
            score,
            mode,
            raised_at_ms: now_ms,
            expires_at_ms: now_ms + self.alert_ms,
        };
        info!(score, mode = mode.id(), "volatility spike during deep work");
        self.alert = Some(alert.clone());
        Some(alert)
    }

    /// Drop the banner once its display time is over
    pub fn advance_to(&mut self, now_ms: u64) {
        if self.alert.as_ref().is_some_and(|a| now_ms >= a.expires_at_ms) {
            self.alert = None;
        }
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.alert.as_ref().map(|a| a.expires_at_ms)
    }

    /// Hide the banner (mode started or stopped)
    pub fn clear(&mut self) {
        self.alert = None;
    }

    pub fn active_alert(&self) -> Option<&SpikeAlert> {
        self.alert.as_ref()
    }
}

/// Everything the advisory surface shows for the current state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyReport {
    pub state: IviState,
    pub mode: FocusMode,
    pub recommendation: &'static str,
    pub profile: DeviceProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<SpikeAlert>,
}

/// Assemble the advisory view for a state, mode, and optional banner
pub fn evaluate_policy(state: IviState, mode: FocusMode, alert: Option<&SpikeAlert>) -> PolicyReport {
    // Entering deep work manually pins the Focus Lock profile
    let profile_state = if mode.is_deep_work() {
        IviState::DeepFocus
    } else {
        state
    };
    PolicyReport {
        state,
        mode,
        recommendation: recommendation(state),
        profile: *device_profile(profile_state),
        alert: alert.cloned(),
    }
}
