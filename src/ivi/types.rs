//! IVI data types
//!
//! Counters, scores, states, and the snapshot published by the aggregation loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Interaction event counts accumulated since the last decay ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionCounters {
    /// Foreground application transitions
    pub app_switches: u32,
    /// Browser tab open/close events
    pub tab_churn: u32,
    /// Rapid back-and-forth transitions between the same two contexts
    pub oscillations: u32,
}

impl InteractionCounters {
    pub fn new(app_switches: u32, tab_churn: u32, oscillations: u32) -> Self {
        Self {
            app_switches,
            tab_churn,
            oscillations,
        }
    }

    /// Apply a signed delta to every counter, flooring at zero.
    pub fn apply(&mut self, delta: CounterDelta) {
        self.app_switches = saturating_add_signed(self.app_switches, delta.app_switches);
        self.tab_churn = saturating_add_signed(self.tab_churn, delta.tab_churn);
        self.oscillations = saturating_add_signed(self.oscillations, delta.oscillations);
    }

    /// Subtract `step` from every counter, flooring at zero.
    pub fn decay(&mut self, step: u32) {
        self.app_switches = self.app_switches.saturating_sub(step);
        self.tab_churn = self.tab_churn.saturating_sub(step);
        self.oscillations = self.oscillations.saturating_sub(step);
    }

    pub fn is_zero(&self) -> bool {
        self.app_switches == 0 && self.tab_churn == 0 && self.oscillations == 0
    }
}

fn saturating_add_signed(value: u32, delta: i32) -> u32 {
    if delta >= 0 {
        value.saturating_add(delta.unsigned_abs())
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}

/// A signed batch change applied to all three counters at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterDelta {
    pub app_switches: i32,
    pub tab_churn: i32,
    pub oscillations: i32,
}

impl CounterDelta {
    pub const fn new(app_switches: i32, tab_churn: i32, oscillations: i32) -> Self {
        Self {
            app_switches,
            tab_churn,
            oscillations,
        }
    }
}

/// Qualitative workload band over the score range
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IviState {
    /// 0-25
    DeepFocus,
    /// 26-50
    Stable,
    /// 51-75
    Fragmented,
    /// 76-100
    Overloaded,
}

impl IviState {
    pub const ALL: [IviState; 4] = [
        IviState::DeepFocus,
        IviState::Stable,
        IviState::Fragmented,
        IviState::Overloaded,
    ];

    /// Human-readable label, e.g. "Deep Focus"
    pub fn label(&self) -> &'static str {
        match self {
            IviState::DeepFocus => "Deep Focus",
            IviState::Stable => "Stable",
            IviState::Fragmented => "Fragmented",
            IviState::Overloaded => "Overloaded",
        }
    }

    /// Inclusive score range covered by this band
    pub fn range(&self) -> (u8, u8) {
        match self {
            IviState::DeepFocus => (0, 25),
            IviState::Stable => (26, 50),
            IviState::Fragmented => (51, 75),
            IviState::Overloaded => (76, 100),
        }
    }

    /// Parse a label leniently ("Deep Focus", "deep_focus", "DeepFocus").
    ///
    /// Returns `None` for unrecognized keys; table lookups turn that into the
    /// `Stable` fallback.
    pub fn parse_label(label: &str) -> Option<IviState> {
        let key: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "deepfocus" => Some(IviState::DeepFocus),
            "stable" => Some(IviState::Stable),
            "fragmented" => Some(IviState::Fragmented),
            "overloaded" => Some(IviState::Overloaded),
            _ => None,
        }
    }
}

impl fmt::Display for IviState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for IviState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IviState::parse_label(s).ok_or_else(|| format!("unknown IVI state: {s}"))
    }
}

/// A score together with its band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IviReading {
    /// Score in [0, 100]
    pub score: u8,
    pub state: IviState,
}

/// One entry of the bounded score history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IviSample {
    /// Tick sequence number (1-based, strictly increasing)
    pub seq: u64,
    /// Score computed on this tick
    pub value: u8,
    /// Virtual time of the tick in milliseconds since the loop started
    pub at_ms: u64,
    /// Wall-clock time of the tick
    pub time: DateTime<Utc>,
}

/// Read-only view published by the aggregation loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IviSnapshot {
    /// Aggregation session identifier
    pub session_id: String,
    /// Score published by the most recent tick
    pub score: u8,
    /// Band of `score`
    pub state: IviState,
    /// Most recent scores, oldest first
    pub history: Vec<IviSample>,
    /// Live counters at the moment of the snapshot
    pub counters: InteractionCounters,
    /// Number of ticks fired so far
    pub ticks: u64,
    /// Whether a chaos or focus burst still has pending sub-steps
    pub burst_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&IviState::DeepFocus).unwrap();
        assert_eq!(json, "\"DeepFocus\"");

        let parsed: IviState = serde_json::from_str("\"Overloaded\"").unwrap();
        assert_eq!(parsed, IviState::Overloaded);
    }

    #[test]
    fn test_parse_label_variants() {
        assert_eq!(IviState::parse_label("Deep Focus"), Some(IviState::DeepFocus));
        assert_eq!(IviState::parse_label("deep_focus"), Some(IviState::DeepFocus));
        assert_eq!(IviState::parse_label("FRAGMENTED"), Some(IviState::Fragmented));
        assert_eq!(IviState::parse_label("NotAState"), None);
        assert!("".parse::<IviState>().is_err());
    }

    #[test]
    fn test_states_are_ordered() {
        assert!(IviState::DeepFocus < IviState::Stable);
        assert!(IviState::Stable < IviState::Fragmented);
        assert!(IviState::Fragmented < IviState::Overloaded);
    }

    #[test]
    fn test_apply_floors_at_zero() {
        let mut counters = InteractionCounters::new(3, 1, 0);
        counters.apply(CounterDelta::new(-4, -3, -3));
        assert!(counters.is_zero());

        counters.apply(CounterDelta::new(3, 2, 2));
        assert_eq!(counters, InteractionCounters::new(3, 2, 2));
    }

    #[test]
    fn test_decay_step() {
        let mut counters = InteractionCounters::new(2, 1, 0);
        counters.decay(1);
        assert_eq!(counters, InteractionCounters::new(1, 0, 0));
        counters.decay(1);
        counters.decay(1);
        assert!(counters.is_zero());
    }
}
