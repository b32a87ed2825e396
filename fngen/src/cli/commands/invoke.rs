//! Invoke a definition against a generation backend

use super::{load_definition, parse_input};
use crate::cli::app::InvokeArgs;
use anyhow::{Context, Result};
use fngen_core::{BackendConfig, FunctionError, LenientNormalizer, OpenAiCompatStrategy};
use std::path::Path;
use tracing::{info, warn};

/// Execute the invoke command
pub async fn execute(args: InvokeArgs, config: Option<&Path>) -> Result<()> {
    let definition = load_definition(&args.function.definition)?;
    let backend = load_backend(&args, config)?;
    info!(provider = %backend.provider, model = %backend.model, "Using generation backend");

    let strategy =
        OpenAiCompatStrategy::new(backend).context("Failed to configure generation backend")?;

    let mut builder = definition.into_builder()?.with_strategy(strategy);
    if args.lenient {
        builder = builder.with_normalizer(LenientNormalizer);
    }
    let function = builder.build()?;

    match function.call(parse_input(&args.function.input)).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(FunctionError::Generation(err)) if err.is_transient() => {
            warn!("Backend failure may be transient, retrying later could succeed");
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

fn load_backend(args: &InvokeArgs, config: Option<&Path>) -> Result<BackendConfig> {
    match config {
        Some(path) => BackendConfig::from_file(path)
            .with_context(|| format!("Failed to load backend configuration from {}", path.display())),
        None => BackendConfig::preset(args.provider.name())
            .with_context(|| format!("Unknown provider: {}", args.provider.name())),
    }
}
