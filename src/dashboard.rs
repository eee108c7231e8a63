//! Session dashboard
//!
//! Composes the aggregation loop with the focus-mode timer, spike detection,
//! and voice commands on one virtual timeline. All mutation goes through this
//! type; readers get detached [`DashboardSnapshot`]s.

use crate::aggregator::{AppSwitchTracker, InteractionAggregator, InteractionEvent};
use crate::coach::types::{CoachPayload, UserProfile};
use crate::config::FlowConfig;
use crate::ivi::types::{IviSample, IviSnapshot};
use crate::modes::{FocusMode, ModeController};
use crate::policy::{evaluate_policy, PolicyReport, SpikeAlert, SpikeDetector};
use crate::voice::{VoiceCommand, VoiceControl};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

/// Read-only view of a dashboard at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    /// Virtual time of the snapshot
    pub at_ms: u64,
    pub ivi: IviSnapshot,
    pub mode: FocusMode,
    pub mode_label: &'static str,
    /// Seconds left in a timed mode, 0 otherwise
    pub remaining_secs: u64,
    pub policy: PolicyReport,
}

pub struct FlowDashboard {
    aggregator: InteractionAggregator,
    modes: ModeController,
    spikes: SpikeDetector,
    voice: VoiceControl,
    tracker: AppSwitchTracker,
    now_ms: u64,
    torn_down: bool,
}

impl FlowDashboard {
    pub fn new(config: &FlowConfig) -> Self {
        Self::with_session(config, Uuid::new_v4().to_string(), Utc::now())
    }

    pub fn with_session(config: &FlowConfig, session_id: String, started_at: DateTime<Utc>) -> Self {
        Self {
            aggregator: InteractionAggregator::with_session(
                config.aggregator.clone(),
                session_id,
                started_at,
            ),
            modes: ModeController::new(),
            spikes: SpikeDetector::new(&config.policy),
            voice: VoiceControl::new(true),
            tracker: AppSwitchTracker::default(),
            now_ms: 0,
            torn_down: false,
        }
    }

    /// Replace the voice gate, e.g. when speech recognition is unavailable
    pub fn with_voice(mut self, voice: VoiceControl) -> Self {
        self.voice = voice;
        self
    }

    pub fn start(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
        self.aggregator.start(now_ms);
    }

    /// Tear down every timer; later calls are no-ops.
    pub fn stop(&mut self) {
        if self.torn_down {
            return;
        }
        self.aggregator.stop();
        self.modes.stop();
        self.spikes.clear();
        self.torn_down = true;
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn aggregator(&self) -> &InteractionAggregator {
        &self.aggregator
    }

    pub fn mode(&self) -> FocusMode {
        self.modes.active()
    }

    pub fn active_alert(&self) -> Option<&SpikeAlert> {
        self.spikes.active_alert()
    }

    /// Earliest pending timer across all components
    pub fn next_deadline(&self) -> Option<u64> {
        [
            self.aggregator.next_deadline(),
            self.modes.next_deadline(),
            self.spikes.next_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Move time forward, firing every due timer in deadline order.
    ///
    /// Each tick's score is fed to the spike detector with the mode active at
    /// that instant. Returns the samples published along the way.
    pub fn advance_to(&mut self, now_ms: u64) -> Vec<IviSample> {
        let mut fired = Vec::new();
        if self.torn_down {
            return fired;
        }

        while let Some(deadline) = self.next_deadline().filter(|d| *d <= now_ms) {
            for sample in self.aggregator.advance_to(deadline) {
                self.spikes
                    .observe(sample.value, self.modes.active(), sample.at_ms);
                fired.push(sample);
            }
            if self.modes.advance_to(deadline) {
                self.spikes.clear();
            }
            self.spikes.advance_to(deadline);
        }

        self.aggregator.advance_to(now_ms);
        self.now_ms = self.now_ms.max(now_ms);
        fired
    }

    pub fn record(&mut self, event: InteractionEvent) {
        self.aggregator.record(event);
    }

    /// Bring `app` to the foreground, recording the switch and any oscillation
    pub fn focus_app(&mut self, app: &str) -> Vec<InteractionEvent> {
        if self.torn_down {
            return Vec::new();
        }
        let events = self.tracker.focus(app);
        for event in &events {
            self.aggregator.record(*event);
        }
        events
    }

    pub fn start_chaos_burst(&mut self) {
        self.aggregator.start_chaos_burst();
    }

    pub fn start_focus_burst(&mut self) {
        self.aggregator.start_focus_burst();
    }

    pub fn start_mode(&mut self, mode: FocusMode) {
        if self.torn_down {
            return;
        }
        self.modes.start(mode, self.now_ms);
        self.spikes.clear();
    }

    pub fn stop_mode(&mut self) {
        self.start_mode(FocusMode::None);
    }

    /// Interpret an utterance and apply its mode effect
    pub fn handle_voice(&mut self, utterance: &str) -> Option<VoiceCommand> {
        if self.torn_down {
            return None;
        }
        let command = self.voice.handle(utterance)?;
        if let Some(mode) = command.intent.mode_effect() {
            self.start_mode(mode);
        }
        debug!(transcript = %command.transcript, action = %command.action, "voice command");
        Some(command)
    }

    pub fn policy(&self) -> PolicyReport {
        evaluate_policy(
            self.aggregator.reading().state,
            self.modes.active(),
            self.spikes.active_alert(),
        )
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            at_ms: self.now_ms,
            ivi: self.aggregator.snapshot(),
            mode: self.modes.active(),
            mode_label: self.modes.label(),
            remaining_secs: self.modes.remaining_secs(self.now_ms),
            policy: self.policy(),
        }
    }

    /// Coach request built from the current published state
    pub fn coach_payload(&self, message: &str, profile: &UserProfile) -> CoachPayload {
        CoachPayload::from_snapshot(
            message,
            profile,
            &self.aggregator.snapshot(),
            self.modes.active(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ivi::types::IviState;
    use pretty_assertions::assert_eq;

    const TICK: u64 = 2000;

    fn running() -> FlowDashboard {
        let mut dashboard = FlowDashboard::new(&FlowConfig::default());
        dashboard.start(0);
        dashboard
    }

    #[test]
    fn test_chaos_during_deep_work_raises_spike() {
        let mut dashboard = running();
        dashboard.start_mode(FocusMode::Deep25);
        dashboard.advance_to(TICK);

        dashboard.start_chaos_burst();
        let fired = dashboard.advance_to(2 * TICK);
        assert_eq!(fired.len(), 1);
        // 15*2 + 10*1.5 + 10*3
        assert_eq!(fired[0].value, 75);

        let alert = dashboard.active_alert().unwrap();
        assert_eq!(alert.raised_at_ms, 2 * TICK);
        assert_eq!(alert.title(), "Volatility spike during Deep Work!");

        dashboard.advance_to(2 * TICK + 6000);
        assert!(dashboard.active_alert().is_none());
    }

    #[test]
    fn test_no_spike_without_deep_work() {
        let mut dashboard = running();
        dashboard.start_chaos_burst();
        dashboard.advance_to(TICK);
        assert!(dashboard.active_alert().is_none());
        assert_eq!(dashboard.snapshot().ivi.state, IviState::Fragmented);
    }

    #[test]
    fn test_mode_change_clears_alert() {
        let mut dashboard = running();
        dashboard.start_mode(FocusMode::Deep45);
        dashboard.start_chaos_burst();
        dashboard.advance_to(TICK);
        assert!(dashboard.active_alert().is_some());

        dashboard.stop_mode();
        assert!(dashboard.active_alert().is_none());
        assert_eq!(dashboard.mode(), FocusMode::None);
    }

    #[test]
    fn test_timed_mode_expires_on_timeline() {
        let mut dashboard = running();
        dashboard.start_mode(FocusMode::Deep25);
        let end = 25 * 60 * 1000;
        assert_eq!(dashboard.snapshot().remaining_secs, 25 * 60);

        dashboard.advance_to(end - 1);
        assert_eq!(dashboard.mode(), FocusMode::Deep25);
        dashboard.advance_to(end);
        assert_eq!(dashboard.mode(), FocusMode::None);
        assert_eq!(dashboard.aggregator().snapshot().ticks, end / TICK);
    }

    #[test]
    fn test_voice_applies_mode_effect() {
        let mut dashboard = running();
        let command = dashboard.handle_voice("Start deep work for 90").unwrap();
        assert_eq!(command.action, "Deep Work 90m mode started. MX remapped to Focus Lock.");
        assert_eq!(dashboard.mode(), FocusMode::Deep90);
        assert_eq!(dashboard.snapshot().policy.profile.profile_name, "Focus Lock");

        dashboard.handle_voice("mute notifications");
        assert_eq!(dashboard.mode(), FocusMode::Deep90);

        dashboard.handle_voice("stop");
        assert_eq!(dashboard.mode(), FocusMode::None);
    }

    #[test]
    fn test_unsupported_voice_does_nothing() {
        let mut dashboard = running().with_voice(VoiceControl::new(false));
        assert!(dashboard.handle_voice("start deep work").is_none());
        assert_eq!(dashboard.mode(), FocusMode::None);
    }

    #[test]
    fn test_focus_app_records_oscillation() {
        let mut dashboard = running();
        dashboard.focus_app("VS Code");
        dashboard.focus_app("Slack");
        dashboard.focus_app("VS Code");
        let counters = dashboard.aggregator().counters();
        assert_eq!(counters.app_switches, 6);
        assert_eq!(counters.oscillations, 3);
    }

    #[test]
    fn test_coach_payload_reflects_published_state() {
        let mut dashboard = running();
        dashboard.start_mode(FocusMode::Collaboration);
        dashboard.record(InteractionEvent::AppSwitch);
        dashboard.advance_to(TICK);

        let payload = dashboard.coach_payload("status?", &UserProfile::default());
        assert_eq!(payload.ivi, 4);
        assert_eq!(payload.state, "Deep Focus");
        assert_eq!(payload.mode, "Collaboration");
        assert_eq!(payload.metrics.app_switches_last_10_min, 1);
    }

    #[test]
    fn test_stop_freezes_everything() {
        let mut dashboard = running();
        dashboard.start_mode(FocusMode::Deep25);
        dashboard.stop();

        dashboard.start_mode(FocusMode::Deep90);
        dashboard.record(InteractionEvent::Oscillation);
        assert!(dashboard.advance_to(10 * TICK).is_empty());
        assert_eq!(dashboard.mode(), FocusMode::None);
        assert_eq!(dashboard.next_deadline(), None);
        assert!(dashboard.aggregator().counters().is_zero());
    }
}
