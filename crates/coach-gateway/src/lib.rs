mod error;
mod gateway;
mod prompts;
mod reply;
mod structured;

pub use error::GatewayError;
pub use gateway::{AiGateway, ChatSession, FALLBACK_QUESTION};
pub use prompts::{InterviewPrompts, ADVANCE_MESSAGE, DEFAULT_BATCH_SIZE, HANDSHAKE_MESSAGE};
pub use reply::{FeedbackMode, ModelReply, ReplyProtocol, READY_FOR_NEXT_QUESTION, SESSION_END};
pub use structured::{parse_question_batch, parse_structured_feedback};
