//! In-process model that replays queued responses.
//!
//! Used by the test suites of the gateway and session crates in place of a
//! hosted backend. Every request is recorded so tests can assert on what was
//! sent.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use crate::{GenerateRequest, Model, ModelError, ModelOutput};

/// Model that answers from a queue of scripted results
#[derive(Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<GenerateRequest>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply
    pub fn reply(self, text: &str) -> Self {
        self.push_reply(text);
        self
    }

    /// Queue a failed call
    pub fn fail(self, message: &str) -> Self {
        self.push_failure(message);
        self
    }

    /// Hold every call until the gate is notified once per call
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn push_reply(&self, text: &str) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(Ok(text.to_string()));
        }
    }

    pub fn push_failure(&self, message: &str) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(Err(message.to_string()));
        }
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// The most recent request, if any
    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.requests.lock().ok().and_then(|r| r.last().cloned())
    }
}

#[async_trait]
impl Model for ScriptedModel {
    fn name(&self) -> &str {
        "Scripted"
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<ModelOutput, ModelError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if let Some(ref gate) = self.gate {
            gate.notified().await;
        }

        let next = self
            .responses
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front());

        match next {
            Some(Ok(text)) => Ok(ModelOutput::new(text, Duration::from_millis(1))),
            Some(Err(message)) => Err(ModelError::RequestFailed(message)),
            None => Err(ModelError::RequestFailed(
                "no scripted response left".to_string(),
            )),
        }
    }

    async fn is_available(&self) -> bool {
        true
    }
}
