//! Coach chat transcript

use crate::coach::backend::CoachBackend;
use crate::coach::types::{ChatMessage, CoachPayload, UserProfile};
use crate::ivi::types::IviSnapshot;
use crate::modes::FocusMode;
use tracing::warn;

pub const GREETING: &str = "👋 I'm your FlowShield Cognitive Coach. Ask me anything about your current workflow state, IVI patterns, or how to optimize your focus!";

/// Canned starter questions
pub const SUGGESTIONS: [&str; 3] = [
    "Why is my IVI so high?",
    "How can I stabilize my focus right now?",
    "Design a Deep Work profile for developers.",
];

/// Turn a backend failure into the assistant message shown in the transcript
pub fn advisory_message(error: &str) -> String {
    format!("⚠️ {error}. Please ensure the OpenAI API key is configured correctly on the server.")
}

/// A conversation with the coach over successive snapshots
pub struct CoachSession {
    backend: Box<dyn CoachBackend>,
    profile: UserProfile,
    messages: Vec<ChatMessage>,
    last_error: Option<String>,
}

impl CoachSession {
    pub fn new(backend: Box<dyn CoachBackend>, profile: UserProfile) -> Self {
        Self {
            backend,
            profile,
            messages: vec![ChatMessage::assistant(GREETING)],
            last_error: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn set_profile(&mut self, profile: UserProfile) {
        self.profile = profile;
    }

    /// Error text of the most recent failed request
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Ask a question about the given snapshot.
    ///
    /// Blank input is ignored. Returns the assistant message appended to the
    /// transcript, which is the advisory text when the backend failed.
    pub async fn ask(
        &mut self,
        input: &str,
        snapshot: &IviSnapshot,
        mode: FocusMode,
    ) -> Option<&ChatMessage> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }
        self.last_error = None;
        self.messages.push(ChatMessage::user(text));

        let payload = CoachPayload::from_snapshot(text, &self.profile, snapshot, mode);
        let reply = match self.backend.ask(payload).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(backend = self.backend.name(), error = %e, "coach request failed");
                let error = e.to_string();
                let advisory = advisory_message(&error);
                self.last_error = Some(error);
                advisory
            }
        };

        self.messages.push(ChatMessage::assistant(reply));
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coach::backend::tests::{MockCoach, Scripted};
    use crate::coach::types::ChatRole;
    use crate::ivi::types::{InteractionCounters, IviState};
    use std::sync::atomic::Ordering;

    fn snapshot() -> IviSnapshot {
        IviSnapshot {
            session_id: "s-1".to_string(),
            score: 80,
            state: IviState::Overloaded,
            history: Vec::new(),
            counters: InteractionCounters::new(20, 10, 8),
            ticks: 12,
            burst_active: true,
        }
    }

    #[test]
    fn test_transcript_starts_with_greeting() {
        let session = CoachSession::new(
            Box::new(MockCoach::new(Scripted::Reply("ok"))),
            UserProfile::default(),
        );
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].role, ChatRole::Assistant);
        assert_eq!(session.messages()[0].content, GREETING);
    }

    #[tokio::test]
    async fn test_reply_appended() {
        let mut session = CoachSession::new(
            Box::new(MockCoach::new(Scripted::Reply("Close Slack for 25 minutes."))),
            UserProfile::default(),
        );
        let reply = session
            .ask("  Why is my IVI high?  ", &snapshot(), FocusMode::None)
            .await
            .unwrap();
        assert_eq!(reply.content, "Close Slack for 25 minutes.");

        let messages = session.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, ChatRole::User);
        assert_eq!(messages[1].content, "Why is my IVI high?");
    }

    #[tokio::test]
    async fn test_failure_becomes_advisory() {
        let mut session = CoachSession::new(
            Box::new(MockCoach::new(Scripted::NoKey)),
            UserProfile::default(),
        );
        let reply = session
            .ask("help", &snapshot(), FocusMode::Deep25)
            .await
            .unwrap()
            .content
            .clone();
        assert!(reply.starts_with("⚠️ OpenAI API key not configured."));
        assert!(reply.ends_with("Please ensure the OpenAI API key is configured correctly on the server."));
        assert!(session.last_error().is_some());
    }

    #[tokio::test]
    async fn test_blank_input_ignored() {
        let backend = MockCoach::new(Scripted::Reply("unused"));
        let calls = backend.calls.clone();
        let mut session = CoachSession::new(Box::new(backend), UserProfile::default());

        assert!(session.ask("   ", &snapshot(), FocusMode::None).await.is_none());
        assert_eq!(session.messages().len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
