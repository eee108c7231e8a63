//! Interaction Volatility Index
//!
//! Pure scoring, classification, and the state-keyed lookup tables consumed
//! next to the score.

pub mod mapping;
pub mod presentation;
pub mod score;
pub mod types;

pub use mapping::{
    button_mapping, device_profile, lookup_button_mapping, lookup_device_profile, ButtonMapping,
    ButtonSlot, DeviceProfile,
};
pub use score::{classify, compute_ivi, evaluate, score_raw};
pub use types::{
    CounterDelta, InteractionCounters, IviReading, IviSample, IviSnapshot, IviState,
};
