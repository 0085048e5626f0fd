use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tracing::{debug, info, warn};

use coach_gateway::{
    AiGateway, ChatSession, FeedbackMode, GatewayError, ModelReply, ADVANCE_MESSAGE,
    HANDSHAKE_MESSAGE,
};
use coach_history::HistoryStore;
use coach_logging::{LogEvent, Logger};
use coach_types::{ChatMessage, SessionConfig, SessionRecord};

use crate::busy::BusyGuard;
use crate::error::{RejectReason, SessionError};
use crate::SessionState;

/// Result of a candidate message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The interviewer replied; the reply is now the last transcript entry
    Reply(String),
    /// Feedback was given and the session waits for [`InterviewSession::advance`]
    AwaitingNext(String),
    /// The interviewer signalled the end of the session; call [`InterviewSession::end`]
    EndRequested,
}

/// Result of ending a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndOutcome {
    /// Nothing was answered; no feedback and no history record
    Abandoned,
    Completed {
        feedback: String,
        /// Id of the stored record, if the save succeeded
        record_id: Option<String>,
    },
}

struct Inner {
    state: SessionState,
    transcript: Vec<ChatMessage>,
    chat: Option<ChatSession>,
    started_at: Option<Instant>,
}

/// One mock interview, from greeting to summary.
///
/// All operations take `&self`. At most one remote exchange runs at a time;
/// a concurrent call is rejected with [`RejectReason::Busy`]. The transcript
/// lock is never held across an await.
pub struct InterviewSession {
    id: String,
    config: SessionConfig,
    mode: FeedbackMode,
    gateway: Arc<AiGateway>,
    history: Arc<HistoryStore>,
    logger: Arc<Logger>,
    busy: AtomicBool,
    inner: Mutex<Inner>,
}

impl InterviewSession {
    pub fn new(
        config: SessionConfig,
        mode: FeedbackMode,
        gateway: Arc<AiGateway>,
        history: Arc<HistoryStore>,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            config,
            mode,
            gateway,
            history,
            logger,
            busy: AtomicBool::new(false),
            inner: Mutex::new(Inner {
                state: SessionState::Idle,
                transcript: Vec::new(),
                chat: None,
                started_at: None,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn mode(&self) -> FeedbackMode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// Snapshot of the visible conversation
    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.lock().transcript.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Open the chat and fetch the interviewer's greeting.
    ///
    /// Valid from `Idle`, or from `Error` to retry a failed start.
    pub async fn start(&self) -> Result<String, SessionError> {
        let _busy = BusyGuard::acquire(&self.busy)?;

        let chat = {
            let mut inner = self.lock();
            match inner.state {
                SessionState::Idle | SessionState::Error(_) => {}
                ref other => return Err(RejectReason::InvalidState(other.clone()).into()),
            }
            inner.state = SessionState::Starting;
            inner.transcript.clear();
            inner.chat = None;

            let instruction = self.gateway.interview_instruction(&self.config, self.mode);
            self.gateway.create_chat_session(instruction)
        };

        debug!(session_id = %self.id, "Sending handshake");
        let raw = match self.gateway.send_chat_message(&chat, HANDSHAKE_MESSAGE).await {
            Ok(raw) => raw,
            Err(e) => return Err(self.fail_start(e)),
        };

        // A greeting that is a sentinel or empty leaves nothing to show
        let greeting = match self.gateway.parse_reply(&raw, self.mode) {
            ModelReply::Message(text) | ModelReply::ReadyForNext(text) if !text.is_empty() => text,
            _ => {
                let e = GatewayError::Parse(format!(
                    "no greeting in handshake reply {:?}",
                    raw.trim()
                ));
                return Err(self.fail_start(e));
            }
        };

        {
            let mut inner = self.lock();
            let mut chat = chat;
            chat.record(HANDSHAKE_MESSAGE, &raw);
            inner.chat = Some(chat);
            inner.transcript = vec![ChatMessage::model(greeting.clone())];
            inner.state = SessionState::Active;
            inner.started_at = Some(Instant::now());
        }

        info!(session_id = %self.id, focus = self.config.focus(), "Interview started");
        self.logger.log(&LogEvent::SessionStarted {
            session_id: self.id.clone(),
            topic: self.config.title(),
            difficulty: self.config.difficulty.label().to_string(),
            role: self.config.role().to_string(),
            mode: self.mode.to_string(),
        });

        Ok(greeting)
    }

    /// Send a candidate answer.
    ///
    /// The user turn is appended before the call and removed again if the
    /// call fails.
    pub async fn send_message(&self, text: &str) -> Result<SendOutcome, SessionError> {
        if text.trim().is_empty() {
            return Err(RejectReason::BlankInput.into());
        }
        let _busy = BusyGuard::acquire(&self.busy)?;

        let (chat, prior_len) = {
            let mut inner = self.lock();
            if inner.state != SessionState::Active {
                return Err(RejectReason::InvalidState(inner.state.clone()).into());
            }
            let Some(chat) = inner.chat.clone() else {
                return Err(RejectReason::InvalidState(inner.state.clone()).into());
            };
            let prior_len = inner.transcript.len();
            inner.transcript.push(ChatMessage::user(text));
            (chat, prior_len)
        };

        self.logger.log(&LogEvent::UserMessage {
            session_id: self.id.clone(),
            turn: prior_len + 1,
            chars: text.chars().count(),
        });

        let raw = match self.gateway.send_chat_message(&chat, text).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Exchange failed, rolling back");
                self.lock().transcript.truncate(prior_len);
                self.log_error(&e);
                return Err(SessionError::Exchange(e));
            }
        };

        let reply = self.gateway.parse_reply(&raw, self.mode);
        let mut inner = self.lock();
        if let Some(chat) = inner.chat.as_mut() {
            chat.record(text, &raw);
        }

        let outcome = match reply {
            ModelReply::SessionEnd => {
                info!(session_id = %self.id, "Interviewer ended the session");
                inner.state = SessionState::Ending;
                SendOutcome::EndRequested
            }
            ModelReply::ReadyForNext(body) => {
                if !body.is_empty() {
                    inner.transcript.push(ChatMessage::model(body.clone()));
                }
                inner.state = SessionState::WaitingForNext;
                self.logger.log(&LogEvent::AwaitingNextQuestion {
                    session_id: self.id.clone(),
                    turn: inner.transcript.len(),
                });
                SendOutcome::AwaitingNext(body)
            }
            ModelReply::Message(body) => {
                inner.transcript.push(ChatMessage::model(body.clone()));
                self.logger.log(&LogEvent::ModelReplied {
                    session_id: self.id.clone(),
                    turn: inner.transcript.len(),
                    chars: body.chars().count(),
                });
                SendOutcome::Reply(body)
            }
        };

        Ok(outcome)
    }

    /// Ask for the next question after per-question feedback.
    ///
    /// The request sent to the interviewer does not appear in the transcript.
    pub async fn advance(&self) -> Result<SendOutcome, SessionError> {
        let _busy = BusyGuard::acquire(&self.busy)?;

        let chat = {
            let inner = self.lock();
            if inner.state != SessionState::WaitingForNext {
                return Err(RejectReason::InvalidState(inner.state.clone()).into());
            }
            match inner.chat.clone() {
                Some(chat) => chat,
                None => return Err(RejectReason::InvalidState(inner.state.clone()).into()),
            }
        };

        let raw = match self.gateway.send_chat_message(&chat, ADVANCE_MESSAGE).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Advance failed");
                self.log_error(&e);
                return Err(SessionError::Exchange(e));
            }
        };

        let reply = self.gateway.parse_reply(&raw, self.mode);
        let mut inner = self.lock();
        if let Some(chat) = inner.chat.as_mut() {
            chat.record(ADVANCE_MESSAGE, &raw);
        }

        let outcome = match reply.text() {
            None => {
                inner.state = SessionState::Ending;
                SendOutcome::EndRequested
            }
            Some(text) => {
                let text = text.to_string();
                inner.transcript.push(ChatMessage::model(text.clone()));
                inner.state = SessionState::Active;
                self.logger.log(&LogEvent::ModelReplied {
                    session_id: self.id.clone(),
                    turn: inner.transcript.len(),
                    chars: text.chars().count(),
                });
                SendOutcome::Reply(text)
            }
        };

        Ok(outcome)
    }

    /// Finish the session.
    ///
    /// With at most the greeting in the transcript the session is abandoned
    /// without a feedback call. Otherwise a summary is requested over the
    /// transcript as it is now, and on success one record is saved.
    pub async fn end(&self) -> Result<EndOutcome, SessionError> {
        let _busy = BusyGuard::acquire(&self.busy)?;

        let (transcript, started_at) = {
            let mut inner = self.lock();
            if inner.state.is_ended() {
                return Err(RejectReason::InvalidState(inner.state.clone()).into());
            }

            if inner.transcript.len() <= 1 {
                inner.state = SessionState::Ended(None);
                info!(session_id = %self.id, "Interview abandoned");
                self.logger.log(&LogEvent::SessionAbandoned {
                    session_id: self.id.clone(),
                    turns: inner.transcript.len(),
                });
                return Ok(EndOutcome::Abandoned);
            }

            inner.state = SessionState::Ending;
            (inner.transcript.clone(), inner.started_at)
        };
        let duration_secs = started_at
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or_default();

        let feedback = match self
            .gateway
            .generate_session_summary(&self.config, &transcript)
            .await
        {
            Ok(feedback) => feedback,
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Summary generation failed");
                self.lock().state = SessionState::Ended(None);
                self.log_error(&e);
                self.logger.log(&LogEvent::SessionEnded {
                    session_id: self.id.clone(),
                    turns: transcript.len(),
                    has_feedback: false,
                    duration_secs,
                });
                return Err(SessionError::Feedback(e));
            }
        };

        self.lock().state = SessionState::Ended(Some(feedback.clone()));
        self.logger.log(&LogEvent::FeedbackGenerated {
            session_id: self.id.clone(),
            kind: "summary".to_string(),
            chars: feedback.chars().count(),
        });
        self.logger.log(&LogEvent::SessionEnded {
            session_id: self.id.clone(),
            turns: transcript.len(),
            has_feedback: true,
            duration_secs,
        });

        let record = SessionRecord::interview(
            self.config.clone(),
            transcript,
            Some(feedback.clone()),
        );
        let record_id = save_record(&self.history, &self.logger, record);

        Ok(EndOutcome::Completed {
            feedback,
            record_id,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn fail_start(&self, e: GatewayError) -> SessionError {
        warn!(session_id = %self.id, error = %e, "Interview failed to start");
        self.lock().state = SessionState::Error(e.to_string());
        self.log_error(&e);
        SessionError::Startup(e)
    }

    fn log_error(&self, error: &impl std::fmt::Display) {
        self.logger.log(&LogEvent::ErrorEncountered {
            session_id: self.id.clone(),
            error: error.to_string(),
        });
    }
}

/// Best-effort save; failures are logged and reported as `None`
pub(crate) fn save_record(
    history: &HistoryStore,
    logger: &Logger,
    record: SessionRecord,
) -> Option<String> {
    let id = record.id.clone();
    let kind = record.kind_name();

    match history.save(record) {
        Ok(()) => {
            logger.log(&LogEvent::RecordSaved {
                record_id: id.clone(),
                kind: kind.to_string(),
            });
            Some(id)
        }
        Err(e) => {
            warn!(record_id = %id, error = %e, "Failed to save session record");
            None
        }
    }
}
