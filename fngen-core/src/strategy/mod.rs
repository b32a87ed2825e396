//! Generation strategies
//!
//! A strategy turns a rendered prompt into the backend's raw text reply. The
//! engine passes calls straight through: no queuing, pooling, retries or
//! rate limiting happen on this side of the trait.

pub mod openai;

#[cfg(test)]
pub(crate) mod mock;

use crate::errors::GenerationError;
use async_trait::async_trait;

pub use openai::OpenAiCompatStrategy;

/// Backend that produces function output text for a prompt.
///
/// Implementations must be safe to call concurrently; one instance is shared
/// by every invocation of a configured function.
#[async_trait]
pub trait GenerationStrategy: Send + Sync {
    /// Get the name of this strategy
    fn name(&self) -> &str;

    /// Send the prompt and return the raw reply text
    async fn generate_function_output(&self, prompt: &str) -> Result<String, GenerationError>;
}
