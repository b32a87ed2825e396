//! Render the prompt for a definition and input

use super::{load_definition, parse_input};
use crate::cli::app::FunctionArgs;
use anyhow::{Result, bail};
use std::path::Path;
use tracing::{debug, warn};

/// Execute the prompt command
pub fn execute(args: FunctionArgs, config: Option<&Path>) -> Result<()> {
    if let Some(path) = config {
        warn!("Backend configuration {} is not used when rendering prompts", path.display());
    }

    let definition = load_definition(&args.definition)?;
    let input = parse_input(&args.input);
    if input.is_null() {
        bail!("Input cannot be null");
    }

    let prompt = definition.into_builder()?.into_prompt()?;
    debug!(schema = prompt.schema(), "Compiled prompt");

    println!("{}", prompt.render(&input));
    Ok(())
}
