//! Cognitive coach boundary
//!
//! Builds requests from published snapshots, sends them to a language-model
//! backend, and keeps the chat transcript. Failures surface as advisory
//! messages, never as panics or retries.

pub mod backend;
pub mod handler;
pub mod prompt;
pub mod session;
pub mod types;

pub use backend::{build_coach, CoachBackend, DirectCoach, FallbackCoach, ProxyCoach};
pub use handler::{CoachHandler, HandlerResponse};
pub use session::CoachSession;
pub use types::{ChatMessage, ChatRole, CoachMetrics, CoachPayload, CoachResponse, UserProfile};
