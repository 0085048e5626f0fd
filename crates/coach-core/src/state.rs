use serde::{Deserialize, Serialize};

/// Lifecycle of an interview session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    /// Handshake in flight
    Starting,
    /// Accepting candidate messages
    Active,
    /// Per-question feedback given; waiting for the candidate to advance
    WaitingForNext,
    /// Wrapping up, summary may be in flight
    Ending,
    /// Finished, with the summary if one was produced
    Ended(Option<String>),
    /// Startup failed; `start()` may be retried
    Error(String),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Starting => "starting",
            SessionState::Active => "active",
            SessionState::WaitingForNext => "waiting_for_next",
            SessionState::Ending => "ending",
            SessionState::Ended(_) => "ended",
            SessionState::Error(_) => "error",
        }
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, SessionState::Ended(_))
    }

    /// Summary text once the session has ended with feedback
    pub fn feedback(&self) -> Option<&str> {
        match self {
            SessionState::Ended(feedback) => feedback.as_deref(),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Error(message) => write!(f, "error ({})", message),
            other => write!(f, "{}", other.name()),
        }
    }
}
