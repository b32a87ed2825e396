//! Core functionality for fngen
//!
//! Turns a natural-language task description, example scenarios, declared
//! error conditions and an output type into an async callable whose body is
//! produced by a text-generation backend at call time.
//!
//! ```no_run
//! use fngen_core::{FunctionGenerator, OpenAiCompatStrategy};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let reverse = FunctionGenerator::<String, String>::builder()
//!     .with_description("Reverse the input string")
//!     .with_described_output()
//!     .with_strategy(OpenAiCompatStrategy::openai()?)
//!     .build()?;
//!
//! assert_eq!(reverse.call("hello".to_string()).await?, "olleh");
//! # Ok(())
//! # }
//! ```

pub mod condition;
pub mod config;
pub mod definition;
pub mod engine;
pub mod errors;
pub mod function;
pub mod harvest;
pub mod normalize;
pub mod prompt;
pub mod scenario;
pub mod schema;
pub mod strategy;

pub use condition::ErrorCondition;
pub use config::BackendConfig;
pub use definition::FunctionDefinition;
pub use engine::{FunctionGenerator, FunctionGeneratorBuilder};
pub use errors::{Failure, FunctionError, FunctionResult, GenerationError};
pub use function::{Callable, GeneratedFunction};
pub use normalize::{LenientNormalizer, ResponseNormalizer, StrictNormalizer};
pub use prompt::PromptBuilder;
pub use scenario::Scenario;
pub use schema::{Describe, Field, Primitive, TypeDescriptor};
pub use strategy::{GenerationStrategy, OpenAiCompatStrategy};
