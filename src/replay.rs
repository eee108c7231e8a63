//! Scripted session replay
//!
//! A script is NDJSON, one timed action per line:
//!
//! ```text
//! {"at_ms": 0, "event": "start_mode", "mode": "deep25"}
//! {"at_ms": 500, "event": "app_switch"}
//! {"at_ms": 900, "event": "focus_app", "app": "Slack"}
//! {"at_ms": 4000, "event": "chaos_burst"}
//! {"at_ms": 9000, "event": "voice", "text": "stop"}
//! ```
//!
//! Entries must be ordered by `at_ms`. Replay runs on virtual time, so a
//! script covering an hour finishes instantly.

use crate::aggregator::InteractionEvent;
use crate::dashboard::{DashboardSnapshot, FlowDashboard};
use crate::error::FlowError;
use crate::modes::FocusMode;
use crate::voice::VoiceCommand;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScriptAction {
    AppSwitch,
    TabChurn,
    Oscillation,
    ChaosBurst,
    FocusBurst,
    FocusApp { app: String },
    StartMode { mode: FocusMode },
    StopMode,
    Voice { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: ScriptAction,
}

/// Parse an NDJSON script, skipping blank lines
pub fn parse_script(ndjson: &str) -> Result<Vec<ScriptEntry>, FlowError> {
    let mut entries: Vec<ScriptEntry> = Vec::new();
    for (line_num, line) in ndjson.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let entry = serde_json::from_str::<ScriptEntry>(trimmed).map_err(|e| {
            FlowError::InvalidScript(format!("Failed to parse line {}: {}", line_num + 1, e))
        })?;
        if let Some(previous) = entries.last() {
            if entry.at_ms < previous.at_ms {
                return Err(FlowError::InvalidScript(format!(
                    "line {}: at_ms {} is earlier than the previous entry ({})",
                    line_num + 1,
                    entry.at_ms,
                    previous.at_ms
                )));
            }
        }
        entries.push(entry);
    }
    Ok(entries)
}

/// Everything a replay published
#[derive(Debug, Clone, Serialize)]
pub struct ReplayOutcome {
    /// One snapshot per virtual time at which a tick fired
    pub ticks: Vec<DashboardSnapshot>,
    /// Interpreted voice commands in script order
    pub voice: Vec<VoiceCommand>,
    pub final_snapshot: DashboardSnapshot,
}

/// Run `script` against `dashboard`, continuing until at least `end_ms`.
///
/// The dashboard is started at time zero if it has not been started yet.
pub fn replay(dashboard: &mut FlowDashboard, script: &[ScriptEntry], end_ms: u64) -> ReplayOutcome {
    dashboard.start(0);
    let mut ticks = Vec::new();
    let mut voice = Vec::new();

    for entry in script {
        step_to(dashboard, entry.at_ms, &mut ticks);
        if let Some(command) = apply(dashboard, &entry.action) {
            voice.push(command);
        }
    }

    let end = script.last().map_or(end_ms, |e| e.at_ms.max(end_ms));
    step_to(dashboard, end, &mut ticks);

    ReplayOutcome {
        ticks,
        voice,
        final_snapshot: dashboard.snapshot(),
    }
}

fn step_to(dashboard: &mut FlowDashboard, target_ms: u64, out: &mut Vec<DashboardSnapshot>) {
    while let Some(deadline) = dashboard.next_deadline().filter(|d| *d <= target_ms) {
        if !dashboard.advance_to(deadline).is_empty() {
            out.push(dashboard.snapshot());
        }
    }
    dashboard.advance_to(target_ms);
}

fn apply(dashboard: &mut FlowDashboard, action: &ScriptAction) -> Option<VoiceCommand> {
    match action {
        ScriptAction::AppSwitch => dashboard.record(InteractionEvent::AppSwitch),
        ScriptAction::TabChurn => dashboard.record(InteractionEvent::TabChurn),
        ScriptAction::Oscillation => dashboard.record(InteractionEvent::Oscillation),
        ScriptAction::ChaosBurst => dashboard.start_chaos_burst(),
        ScriptAction::FocusBurst => dashboard.start_focus_burst(),
        ScriptAction::FocusApp { app } => {
            dashboard.focus_app(app);
        }
        ScriptAction::StartMode { mode } => dashboard.start_mode(*mode),
        ScriptAction::StopMode => dashboard.stop_mode(),
        ScriptAction::Voice { text } => return dashboard.handle_voice(text),
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlowConfig;
    use crate::ivi::types::IviState;
    use pretty_assertions::assert_eq;

    const SCRIPT: &str = r#"
{"at_ms": 0, "event": "start_mode", "mode": "deep25"}
{"at_ms": 100, "event": "app_switch"}
{"at_ms": 200, "event": "tab_churn"}

{"at_ms": 2500, "event": "chaos_burst"}
{"at_ms": 7000, "event": "voice", "text": "stop"}
"#;

    #[test]
    fn test_parse_script() {
        let script = parse_script(SCRIPT).unwrap();
        assert_eq!(script.len(), 5);
        assert_eq!(
            script[0].action,
            ScriptAction::StartMode {
                mode: FocusMode::Deep25
            }
        );
        assert_eq!(script[4].at_ms, 7000);
    }

    #[test]
    fn test_parse_error_names_line() {
        let err = parse_script("{\"at_ms\": 0, \"event\": \"app_switch\"}\n{\"at_ms\": 5, \"event\": \"nap\"}")
            .unwrap_err();
        assert!(err.to_string().contains("Failed to parse line 2"));
    }

    #[test]
    fn test_out_of_order_rejected() {
        let err = parse_script(
            "{\"at_ms\": 10, \"event\": \"app_switch\"}\n{\"at_ms\": 5, \"event\": \"tab_churn\"}",
        )
        .unwrap_err();
        assert!(matches!(err, FlowError::InvalidScript(_)));
    }

    #[test]
    fn test_replay_produces_tick_snapshots() {
        let script = parse_script(SCRIPT).unwrap();
        let mut dashboard = FlowDashboard::new(&FlowConfig::default());
        let outcome = replay(&mut dashboard, &script, 8000);

        let scores: Vec<u8> = outcome.ticks.iter().map(|s| s.ivi.score).collect();
        // 4 + 1.5 = 5.5 -> 6; four chaos steps land before the 4000 tick, the
        // fifth right after it
        assert_eq!(scores, vec![6, 62, 71, 64]);
        assert!(outcome.ticks[1].policy.alert.is_none());
        assert_eq!(outcome.ticks[2].ivi.state, IviState::Fragmented);
        assert!(outcome.ticks[2].policy.alert.is_some());
        // stopping the mode cleared the banner
        assert!(outcome.ticks[3].policy.alert.is_none());

        assert_eq!(outcome.voice.len(), 1);
        assert_eq!(outcome.final_snapshot.mode, FocusMode::None);
        assert_eq!(outcome.final_snapshot.at_ms, 8000);
    }

    #[test]
    fn test_empty_script_runs_to_end() {
        let mut dashboard = FlowDashboard::new(&FlowConfig::default());
        let outcome = replay(&mut dashboard, &[], 6000);
        assert_eq!(outcome.ticks.len(), 3);
        assert!(outcome.ticks.iter().all(|s| s.ivi.score == 0));
    }
}
