use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use coach_types::ChatMessage;

use crate::ModelOutput;

/// Default hosted model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default REST endpoint for the hosted model
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Environment variables checked for an API key, in order
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Errors that can occur while calling the model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model request failed: {0}")]
    RequestFailed(String),

    #[error("Model request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Model API returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Model returned no text in its response")]
    EmptyResponse,

    #[error("Model configuration error: {0}")]
    ConfigError(String),
}

/// Configuration for model requests
#[derive(Clone)]
pub struct ModelConfig {
    /// API key sent with every request
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Base URL of the models endpoint
    pub base_url: String,
    /// Optional request timeout (None = transport default)
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ModelConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    /// Read the API key from the first set variable in [`API_KEY_ENV_VARS`]
    pub fn from_env() -> Result<Self, ModelError> {
        Self::from_env_vars(&API_KEY_ENV_VARS)
    }

    /// Read the API key from the first non-empty variable in `vars`
    pub fn from_env_vars(vars: &[&str]) -> Result<Self, ModelError> {
        vars.iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|value| !value.trim().is_empty())
            .map(Self::new)
            .ok_or_else(|| {
                ModelError::ConfigError(format!(
                    "API key not set (checked {})",
                    vars.join(", ")
                ))
            })
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A single generation request
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    /// Persistent instruction for the model (chat sessions)
    pub system_instruction: Option<String>,
    /// Conversation so far; the last entry is the new user turn
    pub contents: Vec<ChatMessage>,
    /// JSON schema constraining the response; implies a JSON response
    pub response_schema: Option<serde_json::Value>,
    /// Ask the model to skip extended reasoning
    pub disable_thinking: bool,
}

impl GenerateRequest {
    /// Single-turn request with one user prompt
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![ChatMessage::user(prompt)],
            ..Default::default()
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn without_thinking(mut self) -> Self {
        self.disable_thinking = true;
        self
    }
}

/// The core abstraction for a hosted text-generation backend
#[async_trait]
pub trait Model: Send + Sync {
    /// Human-readable provider name (e.g., "Gemini")
    fn name(&self) -> &str;

    /// Identifier of the underlying model
    fn model_name(&self) -> &str;

    /// Generate a response for the request
    async fn generate(&self, request: &GenerateRequest) -> Result<ModelOutput, ModelError>;

    /// Check that the backend is reachable with the configured credentials
    async fn is_available(&self) -> bool;
}
