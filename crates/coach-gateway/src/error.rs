use thiserror::Error;

use coach_model::ModelError;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Model request failed: {0}")]
    Request(#[from] ModelError),

    #[error("Model returned non-conforming output: {0}")]
    Parse(String),
}

impl GatewayError {
    pub fn is_parse(&self) -> bool {
        matches!(self, GatewayError::Parse(_))
    }
}
