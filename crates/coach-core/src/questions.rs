use tracing::info;

use coach_gateway::{AiGateway, GatewayError};
use coach_types::SessionConfig;

/// Generate a list of practice questions for a topic
pub async fn generate_question_set(
    gateway: &AiGateway,
    config: &SessionConfig,
    count: usize,
) -> Result<Vec<String>, GatewayError> {
    let questions = gateway.generate_question_batch(config, count).await?;
    info!(
        count = questions.len(),
        topic = %config.title(),
        "Question set ready"
    );
    Ok(questions)
}
