mod gemini;
mod output;
#[cfg(feature = "testing")]
mod scripted;
mod traits;

pub use gemini::GeminiModel;
pub use output::ModelOutput;
#[cfg(feature = "testing")]
pub use scripted::ScriptedModel;
pub use traits::{
    GenerateRequest, Model, ModelConfig, ModelError, API_KEY_ENV_VARS, DEFAULT_BASE_URL,
    DEFAULT_MODEL,
};

/// Create the default hosted model from a configuration
pub fn create_model(config: ModelConfig) -> Result<Box<dyn Model>, ModelError> {
    Ok(Box::new(GeminiModel::new(config)?))
}
