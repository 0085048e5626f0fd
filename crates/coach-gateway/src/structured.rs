//! Parsing of schema-constrained model output.

use serde::Deserialize;

use coach_types::StructuredFeedback;

use crate::GatewayError;

/// Remove a surrounding markdown code fence, if any
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the language tag line ("json")
    match body.find('\n') {
        Some(pos) => body[pos + 1..].trim(),
        None => body.trim(),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackPayload {
    positive: String,
    improvement: String,
    example_answer: String,
}

/// Parse an object with `positive`, `improvement` and `exampleAnswer`
pub fn parse_structured_feedback(text: &str) -> Result<StructuredFeedback, GatewayError> {
    let payload: FeedbackPayload = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| GatewayError::Parse(format!("feedback is not the expected object: {}", e)))?;

    Ok(StructuredFeedback {
        positive: payload.positive,
        improvement: payload.improvement,
        example_answer: payload.example_answer,
    })
}

/// Parse a JSON array of question strings; anything else is rejected whole
pub fn parse_question_batch(text: &str) -> Result<Vec<String>, GatewayError> {
    let value: serde_json::Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| GatewayError::Parse(format!("question list is not valid JSON: {}", e)))?;

    let items = value
        .as_array()
        .ok_or_else(|| GatewayError::Parse("question list is not a JSON array".to_string()))?;

    let questions = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str()
                .map(|s| s.trim().to_string())
                .ok_or_else(|| GatewayError::Parse(format!("question {} is not a string", i + 1)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if questions.is_empty() || questions.iter().any(|q| q.is_empty()) {
        return Err(GatewayError::Parse(
            "question list is empty or contains blank entries".to_string(),
        ));
    }

    Ok(questions)
}
