//! # coach-core
//!
//! Session orchestration for interview-coach.
//!
//! - [`InterviewSession`] - multi-turn mock interview state machine
//! - [`PracticeRound`] - single question with structured feedback
//! - [`generate_question_set`] - a batch of questions to study

mod busy;
mod error;
mod practice;
mod questions;
mod session;
mod state;

pub use coach_gateway::DEFAULT_BATCH_SIZE;
pub use error::{RejectReason, SessionError};
pub use practice::{PracticeOutcome, PracticeRound};
pub use questions::generate_question_set;
pub use session::{EndOutcome, InterviewSession, SendOutcome};
pub use state::SessionState;
