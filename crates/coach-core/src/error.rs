use thiserror::Error;

use coach_gateway::GatewayError;

use crate::SessionState;

/// Why a request was refused without touching the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    BlankInput,
    /// Another exchange is in flight
    Busy,
    InvalidState(SessionState),
    /// An answer was submitted before a question was generated
    NoQuestion,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::BlankInput => write!(f, "input is blank"),
            RejectReason::Busy => write!(f, "another request is still in progress"),
            RejectReason::InvalidState(state) => write!(f, "not allowed while {}", state),
            RejectReason::NoQuestion => write!(f, "no question has been generated yet"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to start the interview: {0}")]
    Startup(#[source] GatewayError),

    #[error("Message exchange failed: {0}")]
    Exchange(#[source] GatewayError),

    #[error("Failed to generate feedback: {0}")]
    Feedback(#[source] GatewayError),

    #[error("Request rejected: {0}")]
    Rejected(RejectReason),
}

impl SessionError {
    pub fn reject_reason(&self) -> Option<&RejectReason> {
        match self {
            SessionError::Rejected(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.reject_reason().is_some()
    }
}

impl From<RejectReason> for SessionError {
    fn from(reason: RejectReason) -> Self {
        SessionError::Rejected(reason)
    }
}
