use serde::{Deserialize, Serialize};
use tracing::debug;

/// Literal reply that ends an interview
pub const SESSION_END: &str = "SESSION_END";

/// Literal suffix of a per-question feedback reply
pub const READY_FOR_NEXT_QUESTION: &str = "READY_FOR_NEXT_QUESTION";

/// How feedback is delivered during a chat session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackMode {
    /// One holistic summary when the session ends
    #[default]
    Summary,
    /// Feedback after every answer, then wait for the candidate
    PerQuestion,
}

impl std::fmt::Display for FeedbackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedbackMode::Summary => write!(f, "summary"),
            FeedbackMode::PerQuestion => write!(f, "per-question"),
        }
    }
}

impl std::str::FromStr for FeedbackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(FeedbackMode::Summary),
            "per-question" | "per_question" | "perquestion" => Ok(FeedbackMode::PerQuestion),
            _ => Err(format!("Unknown feedback mode: {}", s)),
        }
    }
}

/// Which reply format the interviewer is asked to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyProtocol {
    /// Plain text with literal sentinel tokens
    #[default]
    Sentinel,
    /// `<turn>{...}</turn>` blocks carrying an explicit action
    Tagged,
}

impl std::fmt::Display for ReplyProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplyProtocol::Sentinel => write!(f, "sentinel"),
            ReplyProtocol::Tagged => write!(f, "tagged"),
        }
    }
}

impl std::str::FromStr for ReplyProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sentinel" => Ok(ReplyProtocol::Sentinel),
            "tagged" => Ok(ReplyProtocol::Tagged),
            _ => Err(format!("Unknown reply protocol: {}", s)),
        }
    }
}

/// What the interviewer's reply means for the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelReply {
    /// An ordinary turn to show the candidate
    Message(String),
    /// Feedback after which the candidate must ask for the next question
    ReadyForNext(String),
    /// The candidate asked to stop; nothing to show
    SessionEnd,
}

#[derive(Deserialize)]
struct TurnBlock {
    action: TurnAction,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum TurnAction {
    Continue,
    NextQuestion,
    End,
}

impl ModelReply {
    /// Interpret raw model output.
    ///
    /// Under [`ReplyProtocol::Tagged`] a well-formed `<turn>` block wins;
    /// under [`ReplyProtocol::Sentinel`] such blocks are plain text. Sentinel
    /// matching trims the text and compares exactly and case-sensitively, so
    /// `"SESSION_END."` or `"Session_End"` are ordinary messages. Anything
    /// unrecognized is an ordinary message; parsing never fails.
    pub fn parse(raw: &str, mode: FeedbackMode, protocol: ReplyProtocol) -> Self {
        if protocol == ReplyProtocol::Tagged {
            if let Some(reply) = Self::parse_turn_block(raw, mode) {
                return reply;
            }
        }

        Self::parse_sentinels(raw, mode)
    }

    fn parse_turn_block(raw: &str, mode: FeedbackMode) -> Option<Self> {
        let start = raw.find("<turn>")?;
        let end = raw.find("</turn>")?;
        if end < start {
            return None;
        }

        let json_str = raw[start + 6..end].trim();
        let block: TurnBlock = match serde_json::from_str(json_str) {
            Ok(block) => block,
            Err(e) => {
                debug!(error = %e, "Malformed turn block, falling back to sentinels");
                return None;
            }
        };

        let message = if block.message.trim().is_empty() {
            format!("{}{}", &raw[..start], &raw[end + 7..])
                .trim()
                .to_string()
        } else {
            block.message.trim().to_string()
        };

        Some(match block.action {
            TurnAction::End => ModelReply::SessionEnd,
            TurnAction::NextQuestion if mode == FeedbackMode::PerQuestion => {
                ModelReply::ReadyForNext(message)
            }
            TurnAction::NextQuestion | TurnAction::Continue => ModelReply::Message(message),
        })
    }

    fn parse_sentinels(raw: &str, mode: FeedbackMode) -> Self {
        let trimmed = raw.trim();

        if trimmed == SESSION_END {
            debug!("Reply matched session end sentinel");
            return ModelReply::SessionEnd;
        }

        if mode == FeedbackMode::PerQuestion {
            if let Some(body) = trimmed.strip_suffix(READY_FOR_NEXT_QUESTION) {
                debug!("Reply carried ready-for-next sentinel");
                return ModelReply::ReadyForNext(body.trim_end().to_string());
            }
        }

        ModelReply::Message(trimmed.to_string())
    }

    pub fn is_session_end(&self) -> bool {
        matches!(self, ModelReply::SessionEnd)
    }

    /// Text to display, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            ModelReply::Message(text) | ModelReply::ReadyForNext(text) => Some(text),
            ModelReply::SessionEnd => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentinel(raw: &str, mode: FeedbackMode) -> ModelReply {
        ModelReply::parse(raw, mode, ReplyProtocol::Sentinel)
    }

    fn tagged(raw: &str, mode: FeedbackMode) -> ModelReply {
        ModelReply::parse(raw, mode, ReplyProtocol::Tagged)
    }

    #[test]
    fn test_exact_session_end() {
        assert_eq!(sentinel("SESSION_END", FeedbackMode::Summary), ModelReply::SessionEnd);
        assert_eq!(
            sentinel("  SESSION_END\n", FeedbackMode::PerQuestion),
            ModelReply::SessionEnd
        );
        assert_eq!(tagged("SESSION_END", FeedbackMode::Summary), ModelReply::SessionEnd);
    }

    #[test]
    fn test_near_miss_session_end_is_a_message() {
        for raw in ["Session_End", "SESSION_END.", "session_end", "SESSION_END please"] {
            let reply = sentinel(raw, FeedbackMode::Summary);
            assert_eq!(reply, ModelReply::Message(raw.to_string()), "{}", raw);
        }
    }

    #[test]
    fn test_ready_suffix_stripped_in_per_question_mode() {
        let raw = "Good use of the STAR method.\n\nREADY_FOR_NEXT_QUESTION";
        assert_eq!(
            sentinel(raw, FeedbackMode::PerQuestion),
            ModelReply::ReadyForNext("Good use of the STAR method.".into())
        );
    }

    #[test]
    fn test_ready_suffix_ignored_in_summary_mode() {
        let raw = "Nice answer. READY_FOR_NEXT_QUESTION";
        assert_eq!(
            sentinel(raw, FeedbackMode::Summary),
            ModelReply::Message(raw.into())
        );
    }

    #[test]
    fn test_ready_sentinel_must_be_trailing() {
        let raw = "READY_FOR_NEXT_QUESTION? Not yet, tell me more.";
        assert_eq!(
            sentinel(raw, FeedbackMode::PerQuestion),
            ModelReply::Message(raw.into())
        );
    }

    #[test]
    fn test_turn_block_actions() {
        let end = r#"<turn>{"action": "end"}</turn>"#;
        assert!(tagged(end, FeedbackMode::Summary).is_session_end());

        let next = r#"<turn>{"action": "next_question", "message": "Solid answer."}</turn>"#;
        assert_eq!(
            tagged(next, FeedbackMode::PerQuestion),
            ModelReply::ReadyForNext("Solid answer.".into())
        );
        assert_eq!(
            tagged(next, FeedbackMode::Summary),
            ModelReply::Message("Solid answer.".into())
        );

        let cont = r#"Sure. <turn>{"action": "continue"}</turn>"#;
        assert_eq!(
            tagged(cont, FeedbackMode::Summary),
            ModelReply::Message("Sure.".into())
        );
    }

    #[test]
    fn test_turn_block_is_plain_text_under_sentinel_protocol() {
        let raw = r#"The format looks like <turn>{"action": "end"}</turn>, right?"#;
        assert_eq!(
            sentinel(raw, FeedbackMode::Summary),
            ModelReply::Message(raw.into())
        );

        let end = r#"<turn>{"action": "end"}</turn>"#;
        assert!(!sentinel(end, FeedbackMode::PerQuestion).is_session_end());
    }

    #[test]
    fn test_malformed_turn_block_falls_back() {
        let raw = r#"<turn>{"action": "explode"}</turn>"#;
        assert_eq!(tagged(raw, FeedbackMode::Summary), ModelReply::Message(raw.into()));
    }

    #[test]
    fn test_mode_and_protocol_from_str() {
        assert_eq!(
            "per-question".parse::<FeedbackMode>().unwrap(),
            FeedbackMode::PerQuestion
        );
        assert_eq!("Tagged".parse::<ReplyProtocol>().unwrap(), ReplyProtocol::Tagged);
        assert!("chatty".parse::<FeedbackMode>().is_err());
    }
}
