use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use coach_gateway::{AiGateway, FALLBACK_QUESTION};
use coach_history::HistoryStore;
use coach_logging::{LogEvent, Logger};
use coach_types::{SessionConfig, SessionRecord, StructuredFeedback};

use crate::busy::BusyGuard;
use crate::error::{RejectReason, SessionError};
use crate::session::save_record;

/// Feedback for one practice answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeOutcome {
    pub feedback: StructuredFeedback,
    /// Id of the stored record; `None` for placeholder feedback or a failed save
    pub record_id: Option<String>,
}

/// Single-question practice: generate a question, answer it, get feedback.
pub struct PracticeRound {
    id: String,
    config: SessionConfig,
    gateway: Arc<AiGateway>,
    history: Arc<HistoryStore>,
    logger: Arc<Logger>,
    busy: AtomicBool,
    question: Mutex<Option<String>>,
}

impl PracticeRound {
    pub fn new(
        config: SessionConfig,
        gateway: Arc<AiGateway>,
        history: Arc<HistoryStore>,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            config,
            gateway,
            history,
            logger,
            busy: AtomicBool::new(false),
            question: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The question currently being answered, if generation succeeded
    pub fn question(&self) -> Option<String> {
        self.question.lock().ok().and_then(|q| q.clone())
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Generate a new question, replacing the current one.
    ///
    /// On failure the fallback text is returned for display and no question
    /// is loaded.
    pub async fn next_question(&self) -> Result<String, SessionError> {
        let _busy = BusyGuard::acquire(&self.busy)?;

        let generated = self
            .gateway
            .generate_question(self.config.role(), self.config.focus())
            .await;

        let (loaded, shown) = match generated {
            Ok(question) if !question.is_empty() => (Some(question.clone()), question),
            Ok(_) => {
                warn!(round_id = %self.id, "Model returned an empty question");
                (None, FALLBACK_QUESTION.to_string())
            }
            Err(e) => {
                warn!(round_id = %self.id, error = %e, "Question generation failed");
                self.logger.log(&LogEvent::ErrorEncountered {
                    session_id: self.id.clone(),
                    error: e.to_string(),
                });
                (None, FALLBACK_QUESTION.to_string())
            }
        };

        if let Ok(mut question) = self.question.lock() {
            *question = loaded;
        }
        Ok(shown)
    }

    /// Ask for feedback on an answer to the current question.
    ///
    /// Model failures produce [`StructuredFeedback::unavailable`], which is
    /// shown but never saved.
    pub async fn submit_answer(&self, answer: &str) -> Result<PracticeOutcome, SessionError> {
        if answer.trim().is_empty() {
            return Err(RejectReason::BlankInput.into());
        }
        let _busy = BusyGuard::acquire(&self.busy)?;
        let question = self.question().ok_or(RejectReason::NoQuestion)?;

        let feedback = match self
            .gateway
            .generate_structured_feedback(&question, answer)
            .await
        {
            Ok(feedback) => feedback,
            Err(e) => {
                warn!(round_id = %self.id, error = %e, "Feedback generation failed");
                self.logger.log(&LogEvent::ErrorEncountered {
                    session_id: self.id.clone(),
                    error: e.to_string(),
                });
                return Ok(PracticeOutcome {
                    feedback: StructuredFeedback::unavailable(),
                    record_id: None,
                });
            }
        };

        self.logger.log(&LogEvent::FeedbackGenerated {
            session_id: self.id.clone(),
            kind: "structured".to_string(),
            chars: feedback.positive.len()
                + feedback.improvement.len()
                + feedback.example_answer.len(),
        });

        let record_id = if feedback.is_unavailable() {
            None
        } else {
            let record = SessionRecord::practice(
                self.config.clone(),
                question,
                answer.to_string(),
                feedback.clone(),
            );
            save_record(&self.history, &self.logger, record)
        };

        info!(round_id = %self.id, saved = record_id.is_some(), "Practice answer reviewed");
        Ok(PracticeOutcome {
            feedback,
            record_id,
        })
    }
}
