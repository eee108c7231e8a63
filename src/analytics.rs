//! Sample-day analytics
//!
//! A fixed workday of half-hourly IVI readings and per-app switch counts, with
//! the summary figures derived from it.

use crate::ivi::score::classify;
use crate::ivi::types::IviState;
use serde::Serialize;
use std::collections::BTreeMap;

/// Minutes covered by one sample
pub const SAMPLE_MINUTES: u32 = 30;

/// Samples in the "most stable" window (two hours)
pub const STABLE_WINDOW_SAMPLES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayPoint {
    /// Minutes since midnight
    pub minute_of_day: u32,
    pub ivi: u8,
}

impl DayPoint {
    const fn at(hour: u32, minute: u32, ivi: u8) -> Self {
        Self {
            minute_of_day: hour * 60 + minute,
            ivi,
        }
    }

    pub fn time_label(&self) -> String {
        format_clock(self.minute_of_day)
    }

    pub fn state(&self) -> IviState {
        classify(self.ivi)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AppSwitchCount {
    pub app: &'static str,
    pub switches: u32,
}

pub const SAMPLE_DAY: [DayPoint; 17] = [
    DayPoint::at(9, 0, 22),
    DayPoint::at(9, 30, 35),
    DayPoint::at(10, 0, 18),
    DayPoint::at(10, 30, 15),
    DayPoint::at(11, 0, 20),
    DayPoint::at(11, 30, 28),
    DayPoint::at(12, 0, 52),
    DayPoint::at(12, 30, 67),
    DayPoint::at(13, 0, 80),
    DayPoint::at(13, 30, 72),
    DayPoint::at(14, 0, 55),
    DayPoint::at(14, 30, 40),
    DayPoint::at(15, 0, 30),
    DayPoint::at(15, 30, 25),
    DayPoint::at(16, 0, 45),
    DayPoint::at(16, 30, 60),
    DayPoint::at(17, 0, 35),
];

pub const SAMPLE_APP_SWITCHES: [AppSwitchCount; 6] = [
    AppSwitchCount { app: "Slack", switches: 48 },
    AppSwitchCount { app: "Browser", switches: 35 },
    AppSwitchCount { app: "VS Code", switches: 22 },
    AppSwitchCount { app: "Figma", switches: 18 },
    AppSwitchCount { app: "Notion", switches: 15 },
    AppSwitchCount { app: "Email", switches: 12 },
];

/// "H:MM" for minutes since midnight
pub fn format_clock(minute_of_day: u32) -> String {
    format!("{}:{:02}", minute_of_day / 60, minute_of_day % 60)
}

/// "2h 30m" style duration
pub fn format_duration(minutes: u32) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub average_ivi: u8,
    pub average_state: IviState,
    pub peak: DayPoint,
    /// Lowest-average two-hour window, e.g. "10:00–12:00"
    pub most_stable_window: Option<String>,
    pub minutes_per_state: BTreeMap<IviState, u32>,
    pub deep_work_minutes: u32,
    pub most_distracting_app: Option<&'static str>,
}

impl DaySummary {
    pub fn insights(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(window) = &self.most_stable_window {
            lines.push(format!(
                "You're most focused between {window}. Protect this window with an automatic Deep Work profile."
            ));
        }
        if let Some(app) = self.most_distracting_app {
            lines.push(format!(
                "{app} drives most of your app switching. Consider remapping your MX side button to 'Back to Primary App' during focus blocks."
            ));
        }
        lines.push(format!(
            "Your IVI peaked at {} around {}. Schedule async work for that part of the day.",
            self.peak.ivi,
            self.peak.time_label()
        ));
        lines
    }
}

/// Summarize a day of samples. Returns `None` for an empty day.
pub fn summarize(points: &[DayPoint], switches: &[AppSwitchCount]) -> Option<DaySummary> {
    let peak = *points.iter().max_by_key(|p| p.ivi)?;

    let total: u32 = points.iter().map(|p| u32::from(p.ivi)).sum();
    let average = (f64::from(total) / points.len() as f64 + 0.5).floor() as u8;

    let mut minutes_per_state: BTreeMap<IviState, u32> =
        IviState::ALL.iter().map(|s| (*s, 0)).collect();
    for point in points {
        *minutes_per_state.entry(point.state()).or_insert(0) += SAMPLE_MINUTES;
    }
    let deep_work_minutes = minutes_per_state
        .get(&IviState::DeepFocus)
        .copied()
        .unwrap_or(0);

    Some(DaySummary {
        average_ivi: average,
        average_state: classify(average),
        peak,
        most_stable_window: most_stable_window(points, STABLE_WINDOW_SAMPLES),
        minutes_per_state,
        deep_work_minutes,
        most_distracting_app: switches.iter().max_by_key(|c| c.switches).map(|c| c.app),
    })
}

/// Window of `len` consecutive samples with the lowest total; first wins ties.
fn most_stable_window(points: &[DayPoint], len: usize) -> Option<String> {
    if len == 0 || points.len() < len {
        return None;
    }
    let mut best: Option<(usize, u32)> = None;
    for (start, window) in points.windows(len).enumerate() {
        let total: u32 = window.iter().map(|p| u32::from(p.ivi)).sum();
        if best.map_or(true, |(_, t)| total < t) {
            best = Some((start, total));
        }
    }
    let (start, _) = best?;
    let first = points[start].minute_of_day;
    let end = points[start + len - 1].minute_of_day + SAMPLE_MINUTES;
    Some(format!("{}–{}", format_clock(first), format_clock(end)))
}

/// Summary of the built-in sample day
pub fn sample_summary() -> Option<DaySummary> {
    summarize(&SAMPLE_DAY, &SAMPLE_APP_SWITCHES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sample_summary() {
        let summary = sample_summary().unwrap();
        // 699 / 17 = 41.1
        assert_eq!(summary.average_ivi, 41);
        assert_eq!(summary.average_state, IviState::Stable);
        assert_eq!(summary.peak.ivi, 80);
        assert_eq!(summary.peak.time_label(), "13:00");
        assert_eq!(summary.most_stable_window.as_deref(), Some("10:00–12:00"));
        assert_eq!(summary.most_distracting_app, Some("Slack"));
    }

    #[test]
    fn test_time_per_state() {
        let summary = sample_summary().unwrap();
        assert_eq!(summary.minutes_per_state[&IviState::DeepFocus], 150);
        assert_eq!(summary.minutes_per_state[&IviState::Stable], 180);
        assert_eq!(summary.minutes_per_state[&IviState::Fragmented], 150);
        assert_eq!(summary.minutes_per_state[&IviState::Overloaded], 30);
        assert_eq!(format_duration(summary.deep_work_minutes), "2h 30m");
    }

    #[test]
    fn test_empty_day() {
        assert!(summarize(&[], &SAMPLE_APP_SWITCHES).is_none());
        assert_eq!(most_stable_window(&SAMPLE_DAY[..3], 4), None);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_clock(9 * 60), "9:00");
        assert_eq!(format_duration(45), "45m");
        assert_eq!(format_duration(120), "2h");
    }

    #[test]
    fn test_insights_mention_window() {
        let insights = sample_summary().unwrap().insights();
        assert_eq!(insights.len(), 3);
        assert!(insights[0].contains("10:00–12:00"));
        assert!(insights[1].starts_with("Slack"));
    }
}
