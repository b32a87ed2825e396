//! Function definitions loaded from TOML
//!
//! A definition carries everything needed to configure a generated function
//! over untyped JSON values except the strategy, which the caller supplies:
//!
//! ```toml
//! description = "Convert a roman numeral to an integer"
//!
//! [output]
//! kind = "primitive"
//! primitive = "integer"
//!
//! [[scenarios]]
//! input = "IV"
//! output = 4
//! description = "subtractive notation"
//!
//! [[errors]]
//! kind = "IllegalArgument"
//! message = "Not a roman numeral"
//! when = "The input is not a valid roman numeral"
//! ```

use crate::engine::{FunctionGenerator, FunctionGeneratorBuilder};
use crate::errors::{Failure, FunctionResult};
use crate::scenario::Scenario;
use crate::schema::TypeDescriptor;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub description: String,

    pub output: TypeDescriptor,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scenarios: Vec<ScenarioDefinition>,

    /// Execution errors the backend is asked to report
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorDefinition>,

    /// Rust test files or directories harvested into the description
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub input: Value,
    pub output: Value,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDefinition {
    pub kind: String,
    pub message: String,
    pub when: String,
}

impl FunctionDefinition {
    /// Load a definition; relative test paths resolve against its directory
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read function definition {}", path.display()))?;

        let mut definition = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid function definition {}", path.display()))?;

        if let Some(base) = path.parent() {
            for test_path in &mut definition.tests {
                if test_path.is_relative() {
                    *test_path = base.join(test_path.as_path());
                }
            }
        }

        Ok(definition)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse function definition")
    }

    /// Builder over JSON values, configured with everything but a strategy
    pub fn into_builder(self) -> FunctionResult<FunctionGeneratorBuilder<Value, Value>> {
        let mut builder = FunctionGenerator::builder()
            .with_description(&self.description)
            .with_output_type(self.output);

        for scenario in self.scenarios {
            builder = builder.with_scenario(Scenario::with_description(
                scenario.input,
                scenario.output,
                scenario.description,
            )?);
        }

        for error in self.errors {
            builder = builder.with_execution_error(Failure::new(error.kind, error.message), error.when);
        }

        for path in &self.tests {
            builder = if path.is_dir() {
                builder.with_test_dir(path)
            } else {
                builder.with_test_file(path)
            };
        }

        Ok(builder)
    }
}
