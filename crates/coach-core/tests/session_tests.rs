use std::sync::Arc;

use tokio::sync::Notify;

use coach_core::{
    EndOutcome, InterviewSession, RejectReason, SendOutcome, SessionError, SessionState,
};
use coach_gateway::{AiGateway, FeedbackMode, ADVANCE_MESSAGE, HANDSHAKE_MESSAGE};
use coach_history::{HistoryFilter, HistoryStore, MemorySlots};
use coach_logging::{LogFormat, Logger};
use coach_model::ScriptedModel;
use coach_types::{find_topic, ChatMessage, RecordKind, SessionConfig};

const GREETING: &str = "Hi, I'm Alex. Tell me about yourself.";

struct Harness {
    model: Arc<ScriptedModel>,
    history: Arc<HistoryStore>,
    session: Arc<InterviewSession>,
}

fn harness(model: ScriptedModel, mode: FeedbackMode) -> Harness {
    let model = Arc::new(model);
    let history = Arc::new(HistoryStore::with_storage(MemorySlots::new()));
    let config = SessionConfig::new(find_topic("behavioral").unwrap().clone());
    let session = Arc::new(InterviewSession::new(
        config,
        mode,
        Arc::new(AiGateway::new(model.clone())),
        history.clone(),
        Arc::new(Logger::new(LogFormat::Compact)),
    ));
    Harness {
        model,
        history,
        session,
    }
}

fn saved(h: &Harness) -> usize {
    h.history.list(&HistoryFilter::default()).len()
}

fn rejection(err: SessionError) -> RejectReason {
    err.reject_reason().cloned().expect("expected a rejection")
}

// ============================================================================
// Start
// ============================================================================

#[tokio::test]
async fn test_start_seeds_transcript_with_greeting() {
    let h = harness(ScriptedModel::new().reply(GREETING), FeedbackMode::Summary);

    let greeting = h.session.start().await.unwrap();

    assert_eq!(greeting, GREETING);
    assert_eq!(h.session.state(), SessionState::Active);
    assert_eq!(h.session.transcript(), vec![ChatMessage::model(GREETING)]);

    let request = h.model.last_request().unwrap();
    assert_eq!(request.contents, vec![ChatMessage::user(HANDSHAKE_MESSAGE)]);
    assert!(request.system_instruction.unwrap().contains("Alex"));
}

#[tokio::test]
async fn test_start_failure_then_retry() {
    let h = harness(
        ScriptedModel::new().fail("network down").reply(GREETING),
        FeedbackMode::Summary,
    );

    let err = h.session.start().await.unwrap_err();
    assert!(matches!(err, SessionError::Startup(_)));
    assert!(matches!(h.session.state(), SessionState::Error(_)));
    assert!(h.session.transcript().is_empty());

    h.session.start().await.unwrap();
    assert_eq!(h.session.state(), SessionState::Active);
    assert_eq!(h.session.transcript().len(), 1);
}

#[tokio::test]
async fn test_start_with_session_end_greeting_fails() {
    let h = harness(
        ScriptedModel::new().reply("  SESSION_END\n").reply(GREETING),
        FeedbackMode::Summary,
    );

    let err = h.session.start().await.unwrap_err();
    match err {
        SessionError::Startup(e) => assert!(e.is_parse()),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(matches!(h.session.state(), SessionState::Error(_)));
    assert!(h.session.transcript().is_empty());

    assert_eq!(h.session.start().await.unwrap(), GREETING);
    assert_eq!(h.session.transcript(), vec![ChatMessage::model(GREETING)]);
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let h = harness(ScriptedModel::new().reply(GREETING), FeedbackMode::Summary);
    h.session.start().await.unwrap();

    let err = h.session.start().await.unwrap_err();
    assert_eq!(
        rejection(err),
        RejectReason::InvalidState(SessionState::Active)
    );
    assert_eq!(h.model.call_count(), 1);
}

// ============================================================================
// Messages
// ============================================================================

#[tokio::test]
async fn test_send_message_grows_transcript_by_two() {
    let h = harness(
        ScriptedModel::new()
            .reply(GREETING)
            .reply("Great. Describe a conflict you resolved."),
        FeedbackMode::Summary,
    );
    h.session.start().await.unwrap();

    let outcome = h.session.send_message("I'm a backend engineer.").await.unwrap();

    assert_eq!(
        outcome,
        SendOutcome::Reply("Great. Describe a conflict you resolved.".into())
    );
    let transcript = h.session.transcript();
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[1], ChatMessage::user("I'm a backend engineer."));
    assert!(!transcript[2].is_user());

    // The chat carries the handshake as committed history
    let request = h.model.last_request().unwrap();
    assert_eq!(request.contents.len(), 3);
    assert_eq!(request.contents[0], ChatMessage::user(HANDSHAKE_MESSAGE));
}

#[tokio::test]
async fn test_blank_message_and_unstarted_session_are_rejected() {
    let h = harness(ScriptedModel::new().reply(GREETING), FeedbackMode::Summary);

    let err = h.session.send_message("hello").await.unwrap_err();
    assert_eq!(rejection(err), RejectReason::InvalidState(SessionState::Idle));

    h.session.start().await.unwrap();
    let err = h.session.send_message("   \n").await.unwrap_err();
    assert_eq!(rejection(err), RejectReason::BlankInput);

    assert_eq!(h.session.transcript().len(), 1);
    assert_eq!(h.model.call_count(), 1);
}

#[tokio::test]
async fn test_failed_exchange_rolls_back() {
    let h = harness(
        ScriptedModel::new()
            .reply(GREETING)
            .fail("timeout")
            .reply("Thanks, next question."),
        FeedbackMode::Summary,
    );
    h.session.start().await.unwrap();
    let before = h.session.transcript();

    let err = h.session.send_message("My answer").await.unwrap_err();
    assert!(matches!(err, SessionError::Exchange(_)));
    assert_eq!(h.session.transcript(), before);
    assert_eq!(h.session.state(), SessionState::Active);

    // The failed turn was never committed to the chat history
    h.session.send_message("My answer again").await.unwrap();
    let request = h.model.last_request().unwrap();
    assert_eq!(request.contents.len(), 3);
    assert_eq!(request.contents[2], ChatMessage::user("My answer again"));
}

#[tokio::test]
async fn test_exact_session_end_sentinel() {
    let h = harness(
        ScriptedModel::new().reply(GREETING).reply("  SESSION_END\n"),
        FeedbackMode::Summary,
    );
    h.session.start().await.unwrap();

    let outcome = h.session.send_message("I'd like to stop here.").await.unwrap();

    assert_eq!(outcome, SendOutcome::EndRequested);
    assert_eq!(h.session.state(), SessionState::Ending);
    let transcript = h.session.transcript();
    assert_eq!(transcript.len(), 2);
    assert!(transcript[1].is_user());
}

#[tokio::test]
async fn test_near_miss_sentinel_is_a_normal_reply() {
    let h = harness(
        ScriptedModel::new().reply(GREETING).reply("SESSION_END."),
        FeedbackMode::Summary,
    );
    h.session.start().await.unwrap();

    let outcome = h.session.send_message("stop").await.unwrap();

    assert_eq!(outcome, SendOutcome::Reply("SESSION_END.".into()));
    assert_eq!(h.session.state(), SessionState::Active);
    assert_eq!(h.session.transcript().len(), 3);
}

// ============================================================================
// Per-question feedback
// ============================================================================

#[tokio::test]
async fn test_ready_for_next_and_advance() {
    let h = harness(
        ScriptedModel::new()
            .reply(GREETING)
            .reply("Good use of STAR.\nREADY_FOR_NEXT_QUESTION")
            .reply("Tell me about a time you missed a deadline."),
        FeedbackMode::PerQuestion,
    );
    h.session.start().await.unwrap();

    let outcome = h.session.send_message("I led a migration.").await.unwrap();
    assert_eq!(outcome, SendOutcome::AwaitingNext("Good use of STAR.".into()));
    assert_eq!(h.session.state(), SessionState::WaitingForNext);
    assert_eq!(
        h.session.transcript().last(),
        Some(&ChatMessage::model("Good use of STAR."))
    );

    // Answers are not accepted until the candidate advances
    let err = h.session.send_message("more").await.unwrap_err();
    assert_eq!(
        rejection(err),
        RejectReason::InvalidState(SessionState::WaitingForNext)
    );

    let outcome = h.session.advance().await.unwrap();
    assert_eq!(
        outcome,
        SendOutcome::Reply("Tell me about a time you missed a deadline.".into())
    );
    assert_eq!(h.session.state(), SessionState::Active);

    let transcript = h.session.transcript();
    assert_eq!(transcript.len(), 4);
    assert!(transcript.iter().all(|m| m.content != ADVANCE_MESSAGE));

    let request = h.model.last_request().unwrap();
    assert_eq!(request.contents.last(), Some(&ChatMessage::user(ADVANCE_MESSAGE)));
}

#[tokio::test]
async fn test_advance_outside_waiting_is_rejected() {
    let h = harness(ScriptedModel::new().reply(GREETING), FeedbackMode::PerQuestion);

    let err = h.session.advance().await.unwrap_err();
    assert_eq!(rejection(err), RejectReason::InvalidState(SessionState::Idle));

    h.session.start().await.unwrap();
    let err = h.session.advance().await.unwrap_err();
    assert_eq!(rejection(err), RejectReason::InvalidState(SessionState::Active));
    assert_eq!(h.model.call_count(), 1);
}

#[tokio::test]
async fn test_advance_failure_keeps_waiting() {
    let h = harness(
        ScriptedModel::new()
            .reply(GREETING)
            .reply("Nice. READY_FOR_NEXT_QUESTION")
            .fail("503"),
        FeedbackMode::PerQuestion,
    );
    h.session.start().await.unwrap();
    h.session.send_message("answer").await.unwrap();

    let err = h.session.advance().await.unwrap_err();
    assert!(matches!(err, SessionError::Exchange(_)));
    assert_eq!(h.session.state(), SessionState::WaitingForNext);
}

#[tokio::test]
async fn test_ready_sentinel_ignored_in_summary_mode() {
    let h = harness(
        ScriptedModel::new()
            .reply(GREETING)
            .reply("Nice. READY_FOR_NEXT_QUESTION"),
        FeedbackMode::Summary,
    );
    h.session.start().await.unwrap();

    let outcome = h.session.send_message("answer").await.unwrap();
    assert_eq!(
        outcome,
        SendOutcome::Reply("Nice. READY_FOR_NEXT_QUESTION".into())
    );
    assert_eq!(h.session.state(), SessionState::Active);
}

// ============================================================================
// Ending
// ============================================================================

#[tokio::test]
async fn test_end_with_only_greeting_is_abandoned() {
    let h = harness(ScriptedModel::new().reply(GREETING), FeedbackMode::Summary);
    h.session.start().await.unwrap();

    let outcome = h.session.end().await.unwrap();

    assert_eq!(outcome, EndOutcome::Abandoned);
    assert_eq!(h.session.state(), SessionState::Ended(None));
    assert_eq!(h.model.call_count(), 1);
    assert_eq!(saved(&h), 0);
}

#[tokio::test]
async fn test_end_saves_exactly_one_record_with_transcript() {
    let h = harness(
        ScriptedModel::new()
            .reply(GREETING)
            .reply("What's your biggest strength?")
            .reply("Clear communicator; quantify results more."),
        FeedbackMode::Summary,
    );
    h.session.start().await.unwrap();
    h.session.send_message("I'm a backend engineer.").await.unwrap();
    let at_call = h.session.transcript();

    let outcome = h.session.end().await.unwrap();

    let EndOutcome::Completed {
        feedback,
        record_id,
    } = outcome
    else {
        panic!("expected a completed session");
    };
    assert_eq!(feedback, "Clear communicator; quantify results more.");
    assert_eq!(
        h.session.state(),
        SessionState::Ended(Some(feedback.clone()))
    );

    let records = h.history.list(&HistoryFilter::default());
    assert_eq!(records.len(), 1);
    assert_eq!(Some(records[0].id.clone()), record_id);
    match &records[0].kind {
        RecordKind::Interview {
            transcript,
            feedback: stored,
        } => {
            assert_eq!(transcript, &at_call);
            assert_eq!(stored.as_deref(), Some(feedback.as_str()));
        }
        other => panic!("unexpected record kind: {:?}", other),
    }

    // Summary prompt covered the whole transcript
    let prompt = &h.model.last_request().unwrap().contents[0].content;
    assert!(prompt.contains("Candidate: I'm a backend engineer."));

    let err = h.session.end().await.unwrap_err();
    assert!(err.is_rejected());
    assert_eq!(saved(&h), 1);
}

#[tokio::test]
async fn test_end_after_session_end_sentinel() {
    let h = harness(
        ScriptedModel::new()
            .reply(GREETING)
            .reply("SESSION_END")
            .reply("Short session, good start."),
        FeedbackMode::Summary,
    );
    h.session.start().await.unwrap();
    h.session.send_message("Let's stop.").await.unwrap();

    let outcome = h.session.end().await.unwrap();
    assert!(matches!(outcome, EndOutcome::Completed { .. }));
    assert_eq!(saved(&h), 1);
}

#[tokio::test]
async fn test_feedback_failure_saves_nothing() {
    let h = harness(
        ScriptedModel::new()
            .reply(GREETING)
            .reply("Next question?")
            .fail("quota exceeded"),
        FeedbackMode::Summary,
    );
    h.session.start().await.unwrap();
    h.session.send_message("answer").await.unwrap();

    let err = h.session.end().await.unwrap_err();

    assert!(matches!(err, SessionError::Feedback(_)));
    assert_eq!(h.session.state(), SessionState::Ended(None));
    assert_eq!(saved(&h), 0);
}

// ============================================================================
// Single flight
// ============================================================================

#[tokio::test]
async fn test_concurrent_calls_are_rejected_while_busy() {
    let gate = Arc::new(Notify::new());
    let h = harness(
        ScriptedModel::new()
            .reply(GREETING)
            .reply("Interesting, go on.")
            .gated(gate.clone()),
        FeedbackMode::Summary,
    );

    gate.notify_one();
    h.session.start().await.unwrap();

    let session = h.session.clone();
    let in_flight = tokio::spawn(async move { session.send_message("first").await });
    while !h.session.is_busy() {
        tokio::task::yield_now().await;
    }

    let err = h.session.send_message("second").await.unwrap_err();
    assert_eq!(rejection(err), RejectReason::Busy);
    let err = h.session.end().await.unwrap_err();
    assert_eq!(rejection(err), RejectReason::Busy);
    let err = h.session.advance().await.unwrap_err();
    assert_eq!(rejection(err), RejectReason::Busy);

    gate.notify_one();
    let outcome = in_flight.await.unwrap().unwrap();
    assert_eq!(outcome, SendOutcome::Reply("Interesting, go on.".into()));
    assert!(!h.session.is_busy());
    assert_eq!(h.session.transcript().len(), 3);
    assert_eq!(h.model.call_count(), 2);
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let a = harness(
        ScriptedModel::new().reply(GREETING).reply("A reply"),
        FeedbackMode::Summary,
    );
    let b = harness(ScriptedModel::new().reply(GREETING), FeedbackMode::PerQuestion);

    a.session.start().await.unwrap();
    b.session.start().await.unwrap();
    a.session.send_message("only in a").await.unwrap();

    assert_eq!(a.session.transcript().len(), 3);
    assert_eq!(b.session.transcript().len(), 1);
    assert_ne!(a.session.id(), b.session.id());
    assert_eq!(b.session.mode(), FeedbackMode::PerQuestion);
}
