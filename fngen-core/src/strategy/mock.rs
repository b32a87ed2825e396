//! Scripted generation strategy for tests

use super::GenerationStrategy;
use crate::errors::GenerationError;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Mock strategy that replays queued replies and records every prompt
#[derive(Clone, Default)]
pub struct MockStrategy {
    replies: Arc<Mutex<Vec<Result<String, GenerationError>>>>,
    fallback: Option<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strategy that answers every prompt with the same reply
    pub fn always(reply: impl Into<String>) -> Self {
        Self { fallback: Some(reply.into()), ..Self::default() }
    }

    /// Queue a reply; queued replies are returned in order before the fallback
    pub fn add_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().insert(0, Ok(reply.into()));
    }

    pub fn add_error(&self, error: GenerationError) {
        self.replies.lock().unwrap().insert(0, Err(error));
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl GenerationStrategy for MockStrategy {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate_function_output(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(reply) = self.replies.lock().unwrap().pop() {
            return reply;
        }

        self.fallback
            .clone()
            .ok_or_else(|| GenerationError::invalid_response("mock has no reply queued"))
    }
}
