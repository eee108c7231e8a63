//! Focus modes
//!
//! The active mode is orthogonal to scoring: it never changes the IVI, but is
//! published next to it and conditions the advisory policy. Timed deep-work
//! modes clear themselves when their block ends.

use crate::error::FlowError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusMode {
    #[default]
    None,
    Deep25,
    Deep45,
    Deep90,
    Collaboration,
    Reactive,
}

impl FocusMode {
    pub const SELECTABLE: [FocusMode; 5] = [
        FocusMode::Deep25,
        FocusMode::Deep45,
        FocusMode::Deep90,
        FocusMode::Collaboration,
        FocusMode::Reactive,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            FocusMode::None => "none",
            FocusMode::Deep25 => "deep25",
            FocusMode::Deep45 => "deep45",
            FocusMode::Deep90 => "deep90",
            FocusMode::Collaboration => "collaboration",
            FocusMode::Reactive => "reactive",
        }
    }

    /// Label published to consumers, e.g. "Deep Work 25m"
    pub fn label(&self) -> &'static str {
        match self {
            FocusMode::None => "None",
            FocusMode::Deep25 => "Deep Work 25m",
            FocusMode::Deep45 => "Deep Work 45m",
            FocusMode::Deep90 => "Deep Work 90m",
            FocusMode::Collaboration => "Collaboration",
            FocusMode::Reactive => "Reactive",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FocusMode::None => "No focus mode active.",
            FocusMode::Deep25 => "Pomodoro-style focus block. Min interruptions.",
            FocusMode::Deep45 => "Extended flow state. Full cognitive commitment.",
            FocusMode::Deep90 => "Ultradian rhythm block. Maximum depth.",
            FocusMode::Collaboration => "Optimized for meetings and team work.",
            FocusMode::Reactive => "Inbox processing, reviews, admin tasks.",
        }
    }

    /// Block length for timed modes
    pub fn duration_ms(&self) -> Option<u64> {
        match self {
            FocusMode::Deep25 => Some(25 * 60 * 1000),
            FocusMode::Deep45 => Some(45 * 60 * 1000),
            FocusMode::Deep90 => Some(90 * 60 * 1000),
            _ => None,
        }
    }

    pub fn is_deep_work(&self) -> bool {
        matches!(self, FocusMode::Deep25 | FocusMode::Deep45 | FocusMode::Deep90)
    }

    /// Deep-work mode for a requested block length in minutes
    pub fn deep_work(minutes: u32) -> FocusMode {
        match minutes {
            90 => FocusMode::Deep90,
            45 => FocusMode::Deep45,
            _ => FocusMode::Deep25,
        }
    }
}

impl fmt::Display for FocusMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FocusMode {
    type Err = FlowError;

    /// Accepts ids ("deep45") and labels ("Deep Work 45m"), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        [
            FocusMode::None,
            FocusMode::Deep25,
            FocusMode::Deep45,
            FocusMode::Deep90,
            FocusMode::Collaboration,
            FocusMode::Reactive,
        ]
        .into_iter()
        .find(|m| m.id().eq_ignore_ascii_case(needle) || m.label().eq_ignore_ascii_case(needle))
        .ok_or_else(|| FlowError::UnknownMode(s.to_string()))
    }
}

/// Owner of the active mode and its countdown
#[derive(Debug, Clone, Default)]
pub struct ModeController {
    active: FocusMode,
    started_at_ms: u64,
    ends_at_ms: Option<u64>,
}

impl ModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> FocusMode {
        self.active
    }

    /// Label of the active mode
    pub fn label(&self) -> &'static str {
        self.active.label()
    }

    /// Replace the active mode. Starting `None` is the same as [`stop`](Self::stop).
    pub fn start(&mut self, mode: FocusMode, now_ms: u64) {
        if mode == FocusMode::None {
            self.stop();
            return;
        }
        self.active = mode;
        self.started_at_ms = now_ms;
        self.ends_at_ms = mode.duration_ms().map(|d| now_ms + d);
        info!(mode = mode.id(), "focus mode started");
    }

    pub fn stop(&mut self) {
        if self.active != FocusMode::None {
            info!(mode = self.active.id(), "focus mode stopped");
        }
        self.active = FocusMode::None;
        self.started_at_ms = 0;
        self.ends_at_ms = None;
    }

    /// Expiry of the running timed block
    pub fn next_deadline(&self) -> Option<u64> {
        self.ends_at_ms
    }

    /// Expire the timed block if its end has passed. Returns true on expiry.
    pub fn advance_to(&mut self, now_ms: u64) -> bool {
        match self.ends_at_ms {
            Some(end) if now_ms >= end => {
                info!(mode = self.active.id(), "focus block completed");
                self.active = FocusMode::None;
                self.started_at_ms = 0;
                self.ends_at_ms = None;
                true
            }
            _ => false,
        }
    }

    /// Whole seconds left in the timed block (rounded up), 0 when untimed
    pub fn remaining_secs(&self, now_ms: u64) -> u64 {
        self.ends_at_ms
            .map(|end| end.saturating_sub(now_ms).div_ceil(1000))
            .unwrap_or(0)
    }

    /// Elapsed share of the timed block in percent, 0 when untimed
    pub fn progress_pct(&self, now_ms: u64) -> f64 {
        match self.ends_at_ms {
            Some(end) if end > self.started_at_ms => {
                let total = (end - self.started_at_ms) as f64;
                let elapsed = now_ms.saturating_sub(self.started_at_ms) as f64;
                (elapsed / total * 100.0).clamp(0.0, 100.0)
            }
            _ => 0.0,
        }
    }
}

/// Format seconds as `MM:SS`
pub fn format_countdown(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ids_and_labels() {
        assert_eq!("deep45".parse::<FocusMode>().unwrap(), FocusMode::Deep45);
        assert_eq!("Deep Work 90m".parse::<FocusMode>().unwrap(), FocusMode::Deep90);
        assert_eq!("COLLABORATION".parse::<FocusMode>().unwrap(), FocusMode::Collaboration);
        assert!("nap".parse::<FocusMode>().is_err());
    }

    #[test]
    fn test_timed_mode_expires() {
        let mut modes = ModeController::new();
        modes.start(FocusMode::Deep25, 1_000);
        assert_eq!(modes.next_deadline(), Some(1_000 + 25 * 60 * 1000));
        assert_eq!(modes.remaining_secs(1_000), 25 * 60);

        assert!(!modes.advance_to(1_000 + 25 * 60 * 1000 - 1));
        assert_eq!(modes.remaining_secs(1_000 + 25 * 60 * 1000 - 1), 1);
        assert!(modes.advance_to(1_000 + 25 * 60 * 1000));
        assert_eq!(modes.active(), FocusMode::None);
        assert_eq!(modes.next_deadline(), None);
    }

    #[test]
    fn test_untimed_mode_has_no_deadline() {
        let mut modes = ModeController::new();
        modes.start(FocusMode::Collaboration, 0);
        assert_eq!(modes.next_deadline(), None);
        assert!(!modes.advance_to(u64::MAX));
        assert_eq!(modes.active(), FocusMode::Collaboration);
        assert_eq!(modes.progress_pct(10_000), 0.0);
    }

    #[test]
    fn test_restart_replaces_timer() {
        let mut modes = ModeController::new();
        modes.start(FocusMode::Deep90, 0);
        modes.start(FocusMode::Deep25, 60_000);
        assert_eq!(modes.active(), FocusMode::Deep25);
        assert_eq!(modes.next_deadline(), Some(60_000 + 25 * 60 * 1000));

        modes.start(FocusMode::None, 70_000);
        assert_eq!(modes.active(), FocusMode::None);
    }

    #[test]
    fn test_progress_and_countdown() {
        let mut modes = ModeController::new();
        modes.start(FocusMode::Deep45, 0);
        let half = 45 * 60 * 1000 / 2;
        assert!((modes.progress_pct(half) - 50.0).abs() < 1e-9);
        assert_eq!(format_countdown(modes.remaining_secs(half)), "22:30");
        assert_eq!(format_countdown(0), "00:00");
    }
}
