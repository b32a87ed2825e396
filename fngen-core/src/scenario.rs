//! Example scenarios used as prompt exemplars

use crate::errors::{FunctionError, FunctionResult};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// An input, its expected output, and an optional description.
///
/// Both values are serialized once at construction so that rendering is
/// deterministic for the lifetime of the scenario.
#[derive(Debug, Clone)]
pub struct Scenario<I, O> {
    input: I,
    output: O,
    description: String,
    rendered_input: String,
    rendered_output: String,
}

impl<I: Serialize, O: Serialize> Scenario<I, O> {
    pub fn of(input: I, output: O) -> FunctionResult<Self> {
        Self::with_description(input, output, "")
    }

    pub fn with_description(
        input: I,
        output: O,
        description: impl Into<String>,
    ) -> FunctionResult<Self> {
        let rendered_input = render_non_null(&input, "input")?;
        let rendered_output = render_non_null(&output, "output")?;

        Ok(Self { input, output, description: description.into(), rendered_input, rendered_output })
    }
}

impl<I, O> Scenario<I, O> {
    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl<I, O> fmt::Display for Scenario<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Input: {}, Expected Output: {}", self.rendered_input, self.rendered_output)?;
        if !self.description.is_empty() {
            write!(f, ", Description: {}", self.description)?;
        }
        Ok(())
    }
}

fn render_non_null<T: Serialize>(value: &T, what: &str) -> FunctionResult<String> {
    let value = serde_json::to_value(value).map_err(|e| {
        FunctionError::invalid_argument(format!("Scenario {} cannot be serialized: {}", what, e))
    })?;
    if value.is_null() {
        return Err(FunctionError::invalid_argument("Input and output cannot be null."));
    }
    Ok(display_value(&value))
}

/// Strings render as their raw text, everything else as compact JSON
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
