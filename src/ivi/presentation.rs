//! Presentation metadata for IVI bands
//!
//! Every token here is a pure function of the score, driven by a single table
//! indexed by the score's band.

use crate::ivi::score::classify;
use crate::ivi::types::IviState;
use serde::Serialize;

/// Display tokens for one band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BandStyle {
    pub state: IviState,
    /// Hex color token
    pub color: &'static str,
    /// Gradient utility classes
    pub gradient: &'static str,
    /// Text-emphasis class
    pub text_class: &'static str,
    /// Background class
    pub bg_class: &'static str,
    /// Short advisory message
    pub message: &'static str,
}

static BAND_STYLES: [BandStyle; 4] = [
    BandStyle {
        state: IviState::DeepFocus,
        color: "#06b6d4",
        gradient: "from-cyan-500 to-teal-500",
        text_class: "text-cyan-400",
        bg_class: "bg-cyan-500/20",
        message: "You're in the zone. Let's keep it that way.",
    },
    BandStyle {
        state: IviState::Stable,
        color: "#22c55e",
        gradient: "from-green-500 to-emerald-500",
        text_class: "text-green-400",
        bg_class: "bg-green-500/20",
        message: "Stable flow. Minor context switching detected.",
    },
    BandStyle {
        state: IviState::Fragmented,
        color: "#f97316",
        gradient: "from-orange-500 to-amber-500",
        text_class: "text-orange-400",
        bg_class: "bg-orange-500/20",
        message: "Your brain is juggling too much. Time for a reset?",
    },
    BandStyle {
        state: IviState::Overloaded,
        color: "#ef4444",
        gradient: "from-red-500 to-rose-500",
        text_class: "text-red-400",
        bg_class: "bg-red-500/20",
        message: "Cognitive overload detected. Immediate action recommended.",
    },
];

/// Style row for a band
pub fn style_for_state(state: IviState) -> &'static BandStyle {
    let index = match state {
        IviState::DeepFocus => 0,
        IviState::Stable => 1,
        IviState::Fragmented => 2,
        IviState::Overloaded => 3,
    };
    &BAND_STYLES[index]
}

/// Style row for a score
pub fn style_for_score(score: u8) -> &'static BandStyle {
    style_for_state(classify(score))
}

pub fn color(score: u8) -> &'static str {
    style_for_score(score).color
}

pub fn gradient(score: u8) -> &'static str {
    style_for_score(score).gradient
}

pub fn text_class(score: u8) -> &'static str {
    style_for_score(score).text_class
}

pub fn bg_class(score: u8) -> &'static str {
    style_for_score(score).bg_class
}

pub fn message(score: u8) -> &'static str {
    style_for_score(score).message
}
