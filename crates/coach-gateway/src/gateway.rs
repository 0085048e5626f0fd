use std::sync::Arc;

use coach_model::{GenerateRequest, Model};
use coach_types::{ChatMessage, SessionConfig, StructuredFeedback};
use tracing::{debug, info};

use crate::prompts::InterviewPrompts;
use crate::reply::{FeedbackMode, ModelReply, ReplyProtocol};
use crate::structured::{parse_question_batch, parse_structured_feedback};
use crate::GatewayError;

/// Text shown in place of a question when generation fails
pub const FALLBACK_QUESTION: &str = "Sorry, I couldn't generate a question right now. Please try again.";

/// A multi-turn conversation with a persistent system instruction.
///
/// Sending does not modify the session; the caller commits a completed
/// exchange with [`ChatSession::record`], so a failed call leaves no trace.
#[derive(Debug, Clone)]
pub struct ChatSession {
    system_instruction: String,
    history: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(system_instruction: String) -> Self {
        Self {
            system_instruction,
            history: Vec::new(),
        }
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Committed turns, including ones never shown to the candidate
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Commit a successful exchange
    pub fn record(&mut self, user_text: &str, reply: &str) {
        self.history.push(ChatMessage::user(user_text));
        self.history.push(ChatMessage::model(reply));
    }

    fn request_for(&self, text: &str) -> GenerateRequest {
        let mut contents = self.history.clone();
        contents.push(ChatMessage::user(text));
        GenerateRequest {
            system_instruction: Some(self.system_instruction.clone()),
            contents,
            ..Default::default()
        }
    }
}

/// All outbound calls to the hosted model
pub struct AiGateway {
    model: Arc<dyn Model>,
    protocol: ReplyProtocol,
}

impl AiGateway {
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self {
            model,
            protocol: ReplyProtocol::default(),
        }
    }

    pub fn with_reply_protocol(mut self, protocol: ReplyProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn reply_protocol(&self) -> ReplyProtocol {
        self.protocol
    }

    /// Name of the underlying model
    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Generate one interview question for a role and category
    pub async fn generate_question(
        &self,
        role: &str,
        category: &str,
    ) -> Result<String, GatewayError> {
        let request =
            GenerateRequest::prompt(InterviewPrompts::build_question_prompt(role, category))
                .without_thinking();

        let output = self.model.generate(&request).await?;
        let question = output.trimmed().to_string();

        info!(
            role,
            category,
            duration_secs = output.duration.as_secs_f64(),
            "Generated question"
        );
        Ok(question)
    }

    /// Ask for structured feedback on one answer
    pub async fn generate_structured_feedback(
        &self,
        question: &str,
        answer: &str,
    ) -> Result<StructuredFeedback, GatewayError> {
        let request =
            GenerateRequest::prompt(InterviewPrompts::build_feedback_prompt(question, answer))
                .with_schema(InterviewPrompts::feedback_schema());

        let output = self.model.generate(&request).await?;
        debug!(text_len = output.text.len(), "Received structured feedback");
        parse_structured_feedback(&output.text)
    }

    /// Generate a list of practice questions for a session config
    pub async fn generate_question_batch(
        &self,
        config: &SessionConfig,
        count: usize,
    ) -> Result<Vec<String>, GatewayError> {
        let request =
            GenerateRequest::prompt(InterviewPrompts::build_batch_prompt(config, count))
                .with_schema(InterviewPrompts::batch_schema());

        let output = self.model.generate(&request).await?;
        let questions = parse_question_batch(&output.text)?;

        info!(
            requested = count,
            received = questions.len(),
            focus = config.focus(),
            "Generated question set"
        );
        Ok(questions)
    }

    /// System instruction for an interview chat using this gateway's reply protocol
    pub fn interview_instruction(&self, config: &SessionConfig, mode: FeedbackMode) -> String {
        InterviewPrompts::build_interview_instruction(config, mode, self.protocol)
    }

    /// Interpret a chat reply under this gateway's reply protocol
    pub fn parse_reply(&self, raw: &str, mode: FeedbackMode) -> ModelReply {
        ModelReply::parse(raw, mode, self.protocol)
    }

    /// Open a chat session; no remote call happens until the first message
    pub fn create_chat_session(&self, system_instruction: String) -> ChatSession {
        debug!(
            instruction_len = system_instruction.len(),
            "Creating chat session"
        );
        ChatSession::new(system_instruction)
    }

    /// Send a message within a chat and return the raw reply text
    pub async fn send_chat_message(
        &self,
        chat: &ChatSession,
        text: &str,
    ) -> Result<String, GatewayError> {
        let request = chat.request_for(text);
        let output = self.model.generate(&request).await?;

        debug!(
            turns = chat.history().len() + 1,
            duration_secs = output.duration.as_secs_f64(),
            "Chat reply received"
        );
        Ok(output.text)
    }

    /// Holistic feedback over a finished interview transcript
    pub async fn generate_session_summary(
        &self,
        config: &SessionConfig,
        transcript: &[ChatMessage],
    ) -> Result<String, GatewayError> {
        let request =
            GenerateRequest::prompt(InterviewPrompts::build_summary_prompt(config, transcript));

        let output = self.model.generate(&request).await?;
        if output.is_empty() {
            return Err(GatewayError::Parse("session summary is empty".to_string()));
        }

        info!(
            turns = transcript.len(),
            duration_secs = output.duration.as_secs_f64(),
            "Generated session summary"
        );
        Ok(output.trimmed().to_string())
    }
}
