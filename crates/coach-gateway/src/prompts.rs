use serde_json::json;

use coach_types::{ChatMessage, ChatRole, SessionConfig};

use crate::reply::{FeedbackMode, ReplyProtocol, READY_FOR_NEXT_QUESTION, SESSION_END};

/// First message sent to a new chat so the interviewer greets the candidate
pub const HANDSHAKE_MESSAGE: &str = "Hello";

/// Synthetic message sent when the candidate asks for the next question
pub const ADVANCE_MESSAGE: &str = "I'm ready for the next question.";

/// Number of questions in a generated question set
pub const DEFAULT_BATCH_SIZE: usize = 7;

/// Prompt templates for the interview coach
pub struct InterviewPrompts;

impl InterviewPrompts {
    /// Prompt for a single practice question
    pub fn build_question_prompt(role: &str, category: &str) -> String {
        format!(
            "You are an expert interviewer. Generate one realistic {category} interview question for a {role} role. \
             The question should be concise and typical for a mid-level candidate. \
             Do not add any preamble, explanation, or quotation marks, just the raw question text itself."
        )
    }

    /// Prompt asking for structured feedback on one answer
    pub fn build_feedback_prompt(question: &str, answer: &str) -> String {
        format!(
            r#"You are an expert interview coach. A candidate was asked the following question:
"Question: {question}"

They provided this answer:
"Answer: {answer}"

Provide constructive feedback on their answer."#
        )
    }

    /// Schema for [`coach_types::StructuredFeedback`]
    pub fn feedback_schema() -> serde_json::Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "positive": {
                    "type": "STRING",
                    "description": "A string detailing what was good about the answer."
                },
                "improvement": {
                    "type": "STRING",
                    "description": "A string with specific, actionable suggestions for improvement."
                },
                "exampleAnswer": {
                    "type": "STRING",
                    "description": "A string providing a well-structured, ideal answer to the original question."
                }
            },
            "required": ["positive", "improvement", "exampleAnswer"]
        })
    }

    /// Prompt for a list of practice questions
    pub fn build_batch_prompt(config: &SessionConfig, count: usize) -> String {
        let scope = match config.sub_topic {
            Some(ref sub) => format!(
                "the \"{}\" area of {} ({})",
                sub.name, config.topic.name, sub.description
            ),
            None => format!("{} ({})", config.topic.name, config.topic.description),
        };

        format!(
            "You are an expert interviewer preparing a candidate for a {role} interview. \
             Generate {count} distinct interview questions about {scope}. \
             The questions should be of {difficulty} difficulty. \
             Return only a JSON array of question strings, with no numbering or commentary.",
            role = config.role(),
            difficulty = config.difficulty,
        )
    }

    /// Schema for a question list
    pub fn batch_schema() -> serde_json::Value {
        json!({
            "type": "ARRAY",
            "items": {
                "type": "STRING",
                "description": "A single interview question."
            }
        })
    }

    /// System instruction for a mock interview chat
    pub fn build_interview_instruction(
        config: &SessionConfig,
        mode: FeedbackMode,
        protocol: ReplyProtocol,
    ) -> String {
        let focus = match config.sub_topic {
            Some(ref sub) => format!("{}, specifically {}", config.topic.name, sub.name),
            None => config.topic.name.clone(),
        };

        let mut instruction = format!(
            "You are an AI interviewer named Alex conducting a mock interview for a {role} position. \
             The interview focuses on {focus} at {difficulty} difficulty. \
             Start by greeting the candidate and asking an introductory question. \
             Then proceed with questions relevant to the focus area, one at a time. \
             Keep your questions concise. Wait for the candidate's response before asking the next question. \
             Your goal is to simulate a real interview experience. Do not break character. \
             Keep your responses conversational and engaging.",
            role = config.role(),
            difficulty = config.difficulty,
        );

        if mode == FeedbackMode::PerQuestion {
            instruction.push_str(
                "\n\nAfter each answer, give brief, constructive feedback: what went well and what could be improved. \
                 Do not ask the next question until the candidate says they are ready.",
            );
        }

        match protocol {
            ReplyProtocol::Sentinel => {
                instruction.push_str(&format!(
                    "\n\nIf the candidate says they want to stop or end the interview, reply with exactly {SESSION_END} and nothing else."
                ));
                if mode == FeedbackMode::PerQuestion {
                    instruction.push_str(&format!(
                        " End every feedback message with the literal text {READY_FOR_NEXT_QUESTION}."
                    ));
                }
            }
            ReplyProtocol::Tagged => {
                instruction.push_str(
                    "\n\nWrap every reply in a turn block of the form \
                     <turn>{\"action\": \"continue\", \"message\": \"...\"}</turn>. \
                     Use action \"end\" with an empty message when the candidate wants to stop the interview.",
                );
                if mode == FeedbackMode::PerQuestion {
                    instruction.push_str(
                        " Use action \"next_question\" for feedback messages after which the candidate should move on.",
                    );
                }
            }
        }

        instruction
    }

    /// Prompt asking for a holistic review of a finished interview
    pub fn build_summary_prompt(config: &SessionConfig, transcript: &[ChatMessage]) -> String {
        format!(
            r#"You are an expert interview coach. Review the following mock interview for a {role} position focused on {focus} ({difficulty} difficulty).

## Transcript
{transcript}

---

Provide a holistic summary of the candidate's performance:
1. Overall impression
2. Strengths, with references to specific answers
3. Areas for improvement, with actionable suggestions
4. Two or three concrete next steps for practice"#,
            role = config.role(),
            focus = config.focus(),
            difficulty = config.difficulty,
            transcript = Self::format_transcript(transcript),
        )
    }

    /// Render a transcript as "Interviewer:/Candidate:" lines
    pub fn format_transcript(transcript: &[ChatMessage]) -> String {
        transcript
            .iter()
            .map(|m| {
                let speaker = match m.role {
                    ChatRole::Model => "Interviewer",
                    ChatRole::User => "Candidate",
                };
                format!("{}: {}", speaker, m.content)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
