// Command implementations

pub mod invoke;
pub mod prompt;

use anyhow::{Context, Result};
use fngen_core::FunctionDefinition;
use serde_json::Value;
use std::path::Path;

/// Input text as JSON when it parses, otherwise as a plain string
pub fn parse_input(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

pub fn load_definition(path: &Path) -> Result<FunctionDefinition> {
    FunctionDefinition::from_file(path)
        .with_context(|| format!("Failed to load function definition from {}", path.display()))
}
