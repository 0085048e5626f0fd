use std::sync::Arc;

use coach_core::{generate_question_set, PracticeRound, RejectReason, DEFAULT_BATCH_SIZE};
use coach_gateway::{AiGateway, GatewayError, FALLBACK_QUESTION};
use coach_history::{HistoryFilter, HistoryStore, MemorySlots};
use coach_logging::{LogFormat, Logger};
use coach_model::ScriptedModel;
use coach_types::{find_sub_topic, find_topic, RecordKind, SessionConfig, StructuredFeedback};

const FEEDBACK_JSON: &str = r#"{
    "positive": "You identified the two-pointer approach.",
    "improvement": "State the time and space complexity.",
    "exampleAnswer": "Use a slow and a fast pointer..."
}"#;

fn technical() -> SessionConfig {
    SessionConfig::new(find_topic("technical").unwrap().clone())
}

fn round(
    model: ScriptedModel,
    config: SessionConfig,
) -> (Arc<ScriptedModel>, Arc<HistoryStore>, PracticeRound) {
    let model = Arc::new(model);
    let history = Arc::new(HistoryStore::with_storage(MemorySlots::new()));
    let round = PracticeRound::new(
        config,
        Arc::new(AiGateway::new(model.clone())),
        history.clone(),
        Arc::new(Logger::new(LogFormat::Compact)),
    );
    (model, history, round)
}

// ============================================================================
// Practice rounds
// ============================================================================

#[tokio::test]
async fn test_technical_challenge_round_is_saved() {
    let (model, history, round) = round(
        ScriptedModel::new()
            .reply("How would you detect a cycle in a linked list?\n")
            .reply(FEEDBACK_JSON),
        technical(),
    );

    let question = round.next_question().await.unwrap();
    assert_eq!(question, "How would you detect a cycle in a linked list?");
    let prompt = &model.requests()[0].contents[0].content;
    assert!(prompt.contains("Technical Challenge interview question"));
    assert!(prompt.contains("Software Engineer role"));

    let outcome = round.submit_answer("Floyd's tortoise and hare.").await.unwrap();
    assert_eq!(
        outcome.feedback.improvement,
        "State the time and space complexity."
    );

    let records = history.list(&HistoryFilter::default());
    assert_eq!(records.len(), 1);
    assert_eq!(Some(records[0].id.clone()), outcome.record_id);
    match &records[0].kind {
        RecordKind::Practice {
            question, answer, ..
        } => {
            assert_eq!(question, "How would you detect a cycle in a linked list?");
            assert_eq!(answer, "Floyd's tortoise and hare.");
        }
        other => panic!("unexpected record kind: {:?}", other),
    }
}

#[tokio::test]
async fn test_question_uses_sub_topic_and_role() {
    let (topic, sub) = find_sub_topic("python", "core").unwrap();
    let config = SessionConfig::new(topic.clone())
        .with_sub_topic(sub.clone())
        .with_role("Data Engineer");
    let (model, _history, round) = round(ScriptedModel::new().reply("What is a generator?"), config);

    round.next_question().await.unwrap();

    let prompt = &model.last_request().unwrap().contents[0].content;
    assert!(prompt.contains("Core Language"));
    assert!(prompt.contains("Data Engineer role"));
}

#[tokio::test]
async fn test_question_failure_returns_fallback() {
    let (_model, _history, round) = round(ScriptedModel::new().fail("offline"), technical());

    let question = round.next_question().await.unwrap();

    assert_eq!(question, FALLBACK_QUESTION);
    assert!(round.question().is_none());
    let err = round.submit_answer("an answer").await.unwrap_err();
    assert_eq!(err.reject_reason(), Some(&RejectReason::NoQuestion));
}

#[tokio::test]
async fn test_feedback_failure_is_placeholder_and_not_saved() {
    let (_model, history, round) = round(
        ScriptedModel::new()
            .reply("Explain Big-O notation.")
            .reply("this is not json"),
        technical(),
    );
    round.next_question().await.unwrap();

    let outcome = round.submit_answer("It describes growth.").await.unwrap();

    assert_eq!(outcome.feedback, StructuredFeedback::unavailable());
    assert!(outcome.record_id.is_none());
    assert!(history.list(&HistoryFilter::default()).is_empty());
}

#[tokio::test]
async fn test_blank_answer_is_rejected() {
    let (model, _history, round) = round(ScriptedModel::new().reply("Q?"), technical());
    round.next_question().await.unwrap();

    let err = round.submit_answer("  ").await.unwrap_err();
    assert_eq!(err.reject_reason(), Some(&RejectReason::BlankInput));
    assert_eq!(model.call_count(), 1);
}

// ============================================================================
// Question sets
// ============================================================================

#[tokio::test]
async fn test_generate_question_set() {
    let questions: Vec<String> = (1..=DEFAULT_BATCH_SIZE)
        .map(|i| format!("Question {}", i))
        .collect();
    let model = Arc::new(
        ScriptedModel::new().reply(&serde_json::to_string(&questions).unwrap()),
    );
    let gateway = AiGateway::new(model.clone());

    let set = generate_question_set(&gateway, &technical(), DEFAULT_BATCH_SIZE)
        .await
        .unwrap();

    assert_eq!(set, questions);
}

#[tokio::test]
async fn test_question_set_rejects_non_array() {
    let model = Arc::new(ScriptedModel::new().reply(r#"{"questions": "none"}"#));
    let gateway = AiGateway::new(model);

    let err = generate_question_set(&gateway, &technical(), DEFAULT_BATCH_SIZE)
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Parse(_)));
}
