use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// Header carrying the API key; the key never appears in a URL
const API_KEY_HEADER: &str = "x-goog-api-key";

use coach_types::{ChatMessage, ChatRole};

use crate::{GenerateRequest, Model, ModelConfig, ModelError, ModelOutput};

/// Model implementation that talks to the Gemini REST API
pub struct GeminiModel {
    client: Client,
    config: ModelConfig,
}

impl GeminiModel {
    pub fn new(config: ModelConfig) -> Result<Self, ModelError> {
        if config.api_key.trim().is_empty() {
            return Err(ModelError::ConfigError("API key is empty".to_string()));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ModelError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn model_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn generate_url(&self) -> String {
        format!("{}:generateContent", self.model_url())
    }

    fn map_transport_error(&self, err: reqwest::Error) -> ModelError {
        match (err.is_timeout(), self.config.timeout) {
            (true, Some(timeout)) => ModelError::Timeout(timeout),
            _ => ModelError::RequestFailed(err.without_url().to_string()),
        }
    }
}

#[async_trait]
impl Model for GeminiModel {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<ModelOutput, ModelError> {
        let start = Instant::now();
        let body = GenerateContentRequest::from_request(request);

        debug!(
            model = %self.config.model,
            turns = request.contents.len(),
            json = request.response_schema.is_some(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(self.generate_url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| {
                ModelError::RequestFailed(format!("Failed to decode response: {}", e.without_url()))
            })?;

        let text = extract_text(parsed)?;
        let duration = start.elapsed();

        debug!(
            duration_ms = duration.as_millis(),
            text_len = text.len(),
            "Model responded"
        );

        Ok(ModelOutput::new(text, duration))
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(self.model_url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    fn from_request(request: &GenerateRequest) -> Self {
        let contents = request.contents.iter().map(Content::from_message).collect();

        let system_instruction = request.system_instruction.as_ref().map(|text| Content {
            role: None,
            parts: vec![Part { text: text.clone() }],
        });

        let generation_config = if request.response_schema.is_some() || request.disable_thinking {
            Some(GenerationConfig {
                response_mime_type: request
                    .response_schema
                    .as_ref()
                    .map(|_| "application/json".to_string()),
                response_schema: request.response_schema.clone(),
                thinking_config: request
                    .disable_thinking
                    .then_some(ThinkingConfig { thinking_budget: 0 }),
            })
        } else {
            None
        };

        Self {
            contents,
            system_instruction,
            generation_config,
        }
    }
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

impl Content {
    fn from_message(message: &ChatMessage) -> Self {
        let role = match message.role {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        };
        Self {
            role: Some(role.to_string()),
            parts: vec![Part {
                text: message.content.clone(),
            }],
        }
    }
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Concatenate the text parts of the first candidate
fn extract_text(response: GenerateContentResponse) -> Result<String, ModelError> {
    let parts = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts)
        .unwrap_or_default();

    let text: String = parts.into_iter().filter_map(|p| p.text).collect();
    if text.trim().is_empty() {
        return Err(ModelError::EmptyResponse);
    }
    Ok(text)
}

fn map_http_error(status: StatusCode, body: &str) -> ModelError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .and_then(|wrapper| {
            let msg = wrapper.error.message?;
            Some(match wrapper.error.status {
                Some(status_text) if !status_text.is_empty() => format!("{}: {}", status_text, msg),
                _ => msg,
            })
        })
        .unwrap_or_else(|| body.to_string());

    ModelError::Http {
        status: status.as_u16(),
        message,
    }
}
