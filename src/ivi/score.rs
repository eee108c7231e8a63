//! IVI scoring and state classification
//!
//! Converts a snapshot of interaction counters into a bounded Interaction
//! Volatility Index and its qualitative band.

use crate::ivi::types::{InteractionCounters, IviReading, IviState};

/// Weight of one app switch
pub const APP_SWITCH_WEIGHT: f64 = 2.0;
/// Weight of one tab churn event
pub const TAB_CHURN_WEIGHT: f64 = 1.5;
/// Weight of one oscillation
pub const OSCILLATION_WEIGHT: f64 = 3.0;

/// Upper bound of the score range
pub const MAX_SCORE: u8 = 100;

/// Compute the IVI score for a counter snapshot.
///
/// Formula: `round(clamp(app_switches*2 + tab_churn*1.5 + oscillations*3, 0, 100))`
///
/// Ties at `.5` round up (50.5 becomes 51).
pub fn compute_ivi(counters: &InteractionCounters) -> u8 {
    score_raw(
        counters.app_switches as f64,
        counters.tab_churn as f64,
        counters.oscillations as f64,
    )
}

/// Score arbitrary real-valued counters.
///
/// Negative and NaN inputs count as zero, so the result is always in [0, 100].
pub fn score_raw(app_switches: f64, tab_churn: f64, oscillations: f64) -> u8 {
    let raw = weighted_sum(app_switches.max(0.0), tab_churn.max(0.0), oscillations.max(0.0));
    round_half_up(raw.clamp(0.0, MAX_SCORE as f64)) as u8
}

/// Unclamped weighted sum, as shown in the formula breakdown
pub fn weighted_sum(app_switches: f64, tab_churn: f64, oscillations: f64) -> f64 {
    app_switches * APP_SWITCH_WEIGHT + tab_churn * TAB_CHURN_WEIGHT + oscillations * OSCILLATION_WEIGHT
}

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Classify a score into its band (upper boundaries inclusive).
pub fn classify(score: u8) -> IviState {
    match score {
        0..=25 => IviState::DeepFocus,
        26..=50 => IviState::Stable,
        51..=75 => IviState::Fragmented,
        _ => IviState::Overloaded,
    }
}

/// Score and classify in one step
pub fn evaluate(counters: &InteractionCounters) -> IviReading {
    let score = compute_ivi(counters);
    IviReading {
        score,
        state: classify(score),
    }
}

/// Render the formula with the current values, e.g. `(12×2) + (8×1.5) + (4×3) = 48`
pub fn formula_breakdown(counters: &InteractionCounters) -> String {
    format!(
        "({}×2) + ({}×1.5) + ({}×3) = {}",
        counters.app_switches,
        counters.tab_churn,
        counters.oscillations,
        compute_ivi(counters)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_counters_score_zero() {
        assert_eq!(compute_ivi(&InteractionCounters::default()), 0);
    }

    #[test]
    fn test_reference_example() {
        // 12*2 + 8*1.5 + 4*3 = 24 + 12 + 12 = 48
        let reading = evaluate(&InteractionCounters::new(12, 8, 4));
        assert_eq!(reading.score, 48);
        assert_eq!(reading.state, IviState::Stable);
    }

    #[test]
    fn test_score_clamps_at_100() {
        assert_eq!(compute_ivi(&InteractionCounters::new(60, 0, 0)), 100);
        assert_eq!(compute_ivi(&InteractionCounters::new(u32::MAX, u32::MAX, u32::MAX)), 100);
    }

    #[test]
    fn test_negative_inputs_count_as_zero() {
        assert_eq!(score_raw(-10.0, -4.0, -1.0), 0);
        assert_eq!(score_raw(-10.0, 2.0, 0.0), 3);
        assert_eq!(score_raw(f64::NAN, 0.0, 1.0), 3);
        assert_eq!(score_raw(f64::INFINITY, 0.0, 0.0), 100);
    }

    #[test]
    fn test_half_rounds_up() {
        // 25*2 + 1*1.5 = 51.5 -> 52; 24*2 + 1*1.5 = 49.5 -> 50
        assert_eq!(compute_ivi(&InteractionCounters::new(25, 1, 0)), 52);
        assert_eq!(compute_ivi(&InteractionCounters::new(24, 1, 0)), 50);
        // 50.5 lands in Fragmented rather than Stable
        let reading = evaluate(&InteractionCounters::new(17, 11, 0));
        assert_eq!(reading.score, 51);
        assert_eq!(reading.state, IviState::Fragmented);
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(0), IviState::DeepFocus);
        assert_eq!(classify(25), IviState::DeepFocus);
        assert_eq!(classify(26), IviState::Stable);
        assert_eq!(classify(50), IviState::Stable);
        assert_eq!(classify(51), IviState::Fragmented);
        assert_eq!(classify(75), IviState::Fragmented);
        assert_eq!(classify(76), IviState::Overloaded);
        assert_eq!(classify(100), IviState::Overloaded);
    }

    #[test]
    fn test_classify_matches_band_ranges() {
        for state in IviState::ALL {
            let (lo, hi) = state.range();
            assert_eq!(classify(lo), state);
            assert_eq!(classify(hi), state);
        }
    }

    #[test]
    fn test_score_bounded_and_monotonic() {
        for a in 0..30u32 {
            for t in 0..30u32 {
                for o in 0..20u32 {
                    let base = compute_ivi(&InteractionCounters::new(a, t, o));
                    assert!(base <= MAX_SCORE);
                    assert!(compute_ivi(&InteractionCounters::new(a + 1, t, o)) >= base);
                    assert!(compute_ivi(&InteractionCounters::new(a, t + 1, o)) >= base);
                    assert!(compute_ivi(&InteractionCounters::new(a, t, o + 1)) >= base);
                }
            }
        }
    }

    #[test]
    fn test_formula_breakdown() {
        let text = formula_breakdown(&InteractionCounters::new(12, 8, 4));
        assert_eq!(text, "(12×2) + (8×1.5) + (4×3) = 48");
    }
}
