use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Parse CLI arguments first to get verbosity level
    let cli = Cli::parse();

    // Initialize tracing with appropriate verbosity
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Prompt(args) => {
            info!("Prompt command: {:?}", args);
            cli::commands::prompt::execute(args, cli.config.as_deref())?;
        }
        Commands::Invoke(args) => {
            info!("Invoke command: {:?}", args);
            // Create async runtime for the command
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(cli::commands::invoke::execute(args, cli.config.as_deref()))?;
        }
    }

    Ok(())
}
