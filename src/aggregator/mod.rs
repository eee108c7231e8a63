//! Counter aggregation: events, bursts, decay, and score history

pub mod engine;
pub mod events;

pub use engine::InteractionAggregator;
pub use events::{AppSwitchTracker, BurstKind, InteractionEvent};
