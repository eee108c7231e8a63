//! FlowShield - Interaction Volatility Index engine
//!
//! FlowShield turns desktop interaction counts into a bounded workload score
//! through a deterministic loop: event counting → periodic scoring → bounded
//! history → decay. The score drives state-keyed lookup tables and an advisory
//! policy, and is handed to a language-model coach as structured context.
//!
//! ## Modules
//!
//! - **IVI**: scoring, state bands, button mappings and device profiles
//! - **Aggregator**: counters, chaos/focus bursts, decay, score history
//! - **Dashboard**: aggregator plus focus modes, spike alerts, and voice commands
//! - **Scheduler**: manual clock and the tokio live driver
//! - **Coach**: prompt, proxy/direct backends, chat transcript, server route

pub mod aggregator;
pub mod analytics;
pub mod coach;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod ivi;
pub mod modes;
pub mod policy;
pub mod replay;
pub mod scheduler;
pub mod voice;

pub use aggregator::{AppSwitchTracker, BurstKind, InteractionAggregator, InteractionEvent};
pub use config::FlowConfig;
pub use dashboard::{DashboardSnapshot, FlowDashboard};
pub use error::{CoachError, FlowError};
pub use ivi::{
    classify, compute_ivi, lookup_button_mapping, lookup_device_profile, InteractionCounters,
    IviSnapshot, IviState,
};
pub use modes::{FocusMode, ModeController};
pub use scheduler::{LiveDriver, ManualClock, Timeline};

/// FlowShield version
pub const FLOWSHIELD_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "flowshield";
