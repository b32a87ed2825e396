//! Function generation engine
//!
//! [`FunctionGenerator`] binds a task description, scenarios, error
//! conditions, an output type and a [`GenerationStrategy`] into an immutable
//! callable. Each invocation walks the same path:
//!
//! 1. validate the input and run local pre-execution checks
//! 2. render the prompt
//! 3. call the strategy
//! 4. normalize the raw reply and classify structured error reports
//! 5. decode the payload into the output type
//!
//! Local failures never reach the backend. Backend error reports are mapped
//! back to declared failures by exact message text.

use crate::condition::ErrorCondition;
use crate::errors::{Failure, FunctionError, FunctionResult};
use crate::function::{Callable, GeneratedFunction};
use crate::harvest;
use crate::normalize::{ResponseNormalizer, StrictNormalizer};
use crate::prompt::PromptBuilder;
use crate::scenario::Scenario;
use crate::schema::{Describe, TypeDescriptor};
use crate::strategy::GenerationStrategy;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// A fully configured generated function
pub struct FunctionGenerator<I, O> {
    prompt: PromptBuilder,
    output_type: TypeDescriptor,
    strategy: Arc<dyn GenerationStrategy>,
    conditions: Vec<ErrorCondition<I>>,
    normalizer: Arc<dyn ResponseNormalizer>,
    _output: PhantomData<fn() -> O>,
}

impl<I, O> FunctionGenerator<I, O> {
    pub fn builder() -> FunctionGeneratorBuilder<I, O> {
        FunctionGeneratorBuilder::default()
    }

    pub fn output_type(&self) -> &TypeDescriptor {
        &self.output_type
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn conditions(&self) -> &[ErrorCondition<I>] {
        &self.conditions
    }
}

impl<I, O> FunctionGenerator<I, O>
where
    I: Serialize,
    O: DeserializeOwned,
{
    /// Render the prompt an invocation with `input` would send.
    ///
    /// Local pre-execution checks are not evaluated.
    pub fn render_prompt(&self, input: &I) -> FunctionResult<String> {
        let value = to_input_value(input)?;
        Ok(self.prompt.render(&value))
    }

    pub async fn invoke(&self, input: I) -> FunctionResult<O> {
        let value = self.validate(&input)?;

        let prompt = self.prompt.render(&value);
        debug!(
            strategy = self.strategy.name(),
            prompt_len = prompt.len(),
            "Invoking generation strategy"
        );

        let raw = self.strategy.generate_function_output(&prompt).await?;
        trace!(strategy = self.strategy.name(), "Raw response: {}", raw);

        let payload = self.classify(&raw)?;
        self.decode(payload)
    }

    /// Null input is rejected before local checks; a matching local check
    /// wins over a serialization failure.
    fn validate(&self, input: &I) -> FunctionResult<Value> {
        let serialized = serde_json::to_value(input);
        if matches!(serialized, Ok(Value::Null)) {
            return Err(null_input());
        }

        for condition in self.conditions.iter().filter(|c| !c.is_natural_language()) {
            if let Err(err) = condition.validate(input) {
                debug!("Pre-execution check failed: {}", err);
                return Err(err);
            }
        }

        serialized.map_err(serialization_failure)
    }

    /// Normalize the reply and turn structured error reports into failures
    fn classify(&self, raw: &str) -> FunctionResult<Value> {
        if raw.trim().is_empty() {
            return Err(FunctionError::EmptyResult);
        }

        let normalized = self.normalizer.normalize(raw).inspect_err(|err| {
            warn!(strategy = self.strategy.name(), "{}", err);
        })?;
        let value: Value = serde_json::from_str(&normalized).map_err(|e| {
            FunctionError::malformed_json(format!("Invalid response format: {}", normalized), e)
        })?;

        match error_report(&value) {
            Some(message) => Err(self.remote_failure(message)),
            None => Ok(value),
        }
    }

    fn remote_failure(&self, message: &str) -> FunctionError {
        let declared = self
            .conditions
            .iter()
            .find(|c| c.is_natural_language() && c.error_message() == message)
            .map(ErrorCondition::failure);

        match declared {
            Some(failure) => {
                debug!(kind = failure.kind(), "Backend reported declared failure");
                FunctionError::RemoteCondition(failure.clone())
            }
            None => {
                debug!("Backend reported unclassified error: {}", message);
                FunctionError::unclassified(message)
            }
        }
    }

    fn decode(&self, value: Value) -> FunctionResult<O> {
        if value.is_null() {
            return Err(FunctionError::EmptyResult);
        }

        self.output_type.check_fields(&value).map_err(FunctionError::malformed)?;

        serde_json::from_value(value).map_err(|e| {
            let message = format!(
                "Failed to parse function output as {}: {}",
                self.output_type.simple_name(),
                e
            );
            FunctionError::malformed_json(message, e)
        })
    }
}

#[async_trait]
impl<I, O> Callable<I, O> for FunctionGenerator<I, O>
where
    I: Serialize + Send + 'static,
    O: DeserializeOwned + Send + 'static,
{
    async fn call(&self, input: I) -> FunctionResult<O> {
        self.invoke(input).await
    }
}

fn to_input_value<I: Serialize>(input: &I) -> FunctionResult<Value> {
    let value = serde_json::to_value(input).map_err(serialization_failure)?;
    if value.is_null() {
        return Err(null_input());
    }
    Ok(value)
}

fn null_input() -> FunctionError {
    FunctionError::invalid_argument("Input cannot be null")
}

fn serialization_failure(err: serde_json::Error) -> FunctionError {
    FunctionError::internal("Failed to serialize function input", err)
}

/// Message of a `{"error": true, "message": "..."}` report
fn error_report(value: &Value) -> Option<&str> {
    let object = value.as_object()?;
    if object.get("error").and_then(Value::as_bool) != Some(true) {
        return None;
    }
    object.get("message").and_then(Value::as_str)
}

/// Fluent configuration for a [`FunctionGenerator`].
///
/// Configuration errors are held until [`build`](Self::build) so calls can be
/// chained; the first one wins.
pub struct FunctionGeneratorBuilder<I, O> {
    description: String,
    scenarios: Vec<Scenario<I, O>>,
    conditions: Vec<ErrorCondition<I>>,
    output_type: Option<TypeDescriptor>,
    strategy: Option<Arc<dyn GenerationStrategy>>,
    normalizer: Option<Arc<dyn ResponseNormalizer>>,
    error: Option<FunctionError>,
}

impl<I, O> Default for FunctionGeneratorBuilder<I, O> {
    fn default() -> Self {
        Self {
            description: String::new(),
            scenarios: Vec::new(),
            conditions: Vec::new(),
            output_type: None,
            strategy: None,
            normalizer: None,
            error: None,
        }
    }
}

impl<I, O> FunctionGeneratorBuilder<I, O> {
    /// Append to the task description
    pub fn with_description(mut self, description: impl AsRef<str>) -> Self {
        self.description.push_str(description.as_ref());
        self
    }

    pub fn with_scenario(mut self, scenario: Scenario<I, O>) -> Self {
        self.scenarios.push(scenario);
        self
    }

    pub fn with_scenarios(mut self, scenarios: impl IntoIterator<Item = Scenario<I, O>>) -> Self {
        self.scenarios.extend(scenarios);
        self
    }

    pub fn with_strategy<S: GenerationStrategy + 'static>(self, strategy: S) -> Self {
        self.with_shared_strategy(Arc::new(strategy))
    }

    pub fn with_shared_strategy(mut self, strategy: Arc<dyn GenerationStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_output_type(mut self, output_type: TypeDescriptor) -> Self {
        self.output_type = Some(output_type);
        self
    }

    /// Derive the output type from `O` itself
    pub fn with_described_output(self) -> Self
    where
        O: Describe,
    {
        self.with_output_type(O::descriptor())
    }

    /// Fail with `failure`, without contacting the backend, whenever
    /// `predicate` holds for the input
    pub fn with_pre_execution_check<P>(mut self, failure: Failure, predicate: P) -> Self
    where
        P: Fn(&I) -> bool + Send + Sync + 'static,
    {
        self.conditions.push(ErrorCondition::local(failure, predicate));
        self
    }

    /// Ask the backend to report `failure` when `description` applies
    pub fn with_execution_error(mut self, failure: Failure, description: impl Into<String>) -> Self {
        match ErrorCondition::remote(failure, description) {
            Ok(condition) => self.conditions.push(condition),
            Err(err) => self.record(err),
        }
        self
    }

    pub fn with_condition(mut self, condition: ErrorCondition<I>) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_normalizer<N: ResponseNormalizer + 'static>(mut self, normalizer: N) -> Self {
        self.normalizer = Some(Arc::new(normalizer));
        self
    }

    /// Append the tests found in Rust source text to the description
    pub fn with_test_source(self, source: &str) -> Self {
        let harvested = harvest::harvest_source(source);
        self.with_harvested(harvested)
    }

    pub fn with_test_file(self, path: impl AsRef<Path>) -> Self {
        let harvested = harvest::harvest_file(path.as_ref());
        self.with_harvested(harvested)
    }

    pub fn with_test_dir(self, dir: impl AsRef<Path>) -> Self {
        let harvested = harvest::harvest_dir(dir.as_ref());
        self.with_harvested(harvested)
    }

    fn with_harvested(mut self, harvested: FunctionResult<String>) -> Self {
        match harvested {
            Ok(tests) => {
                if !tests.is_empty() {
                    self.description.push_str("\nUse the following tests as examples:\n");
                    self.description.push_str(&tests);
                }
            }
            Err(err) => self.record(err),
        }
        self
    }

    fn record(&mut self, err: FunctionError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn check(&mut self) -> FunctionResult<TypeDescriptor> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        if self.description.trim().is_empty() {
            return Err(FunctionError::invalid_argument("Function description cannot be empty"));
        }
        self.output_type
            .take()
            .ok_or_else(|| FunctionError::invalid_argument("Output type must be set"))
    }

    /// Compile the prompt without a strategy, for previews
    pub fn into_prompt(mut self) -> FunctionResult<PromptBuilder> {
        let output_type = self.check()?;
        Ok(PromptBuilder::new(&self.description, &self.scenarios, &self.conditions, &output_type))
    }

    /// Finish configuration and return the engine itself
    pub fn build_generator(mut self) -> FunctionResult<FunctionGenerator<I, O>> {
        let output_type = self.check()?;
        let strategy = self
            .strategy
            .ok_or_else(|| FunctionError::invalid_argument("Generation strategy must be set"))?;
        let normalizer: Arc<dyn ResponseNormalizer> =
            self.normalizer.unwrap_or_else(|| Arc::new(StrictNormalizer));

        let prompt =
            PromptBuilder::new(&self.description, &self.scenarios, &self.conditions, &output_type);

        info!(
            strategy = strategy.name(),
            scenarios = self.scenarios.len(),
            conditions = self.conditions.len(),
            output = %output_type.simple_name(),
            "Configured generated function"
        );

        Ok(FunctionGenerator {
            prompt,
            output_type,
            strategy,
            conditions: self.conditions,
            normalizer,
            _output: PhantomData,
        })
    }

    /// Finish configuration and return a callable handle
    pub fn build(self) -> FunctionResult<GeneratedFunction<I, O>>
    where
        I: Serialize + Send + 'static,
        O: DeserializeOwned + Send + 'static,
    {
        self.build_generator().map(GeneratedFunction::new)
    }
}
