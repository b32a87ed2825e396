use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "fngen",
    version,
    about = "Fngen - Run functions whose body is generated by a language model",
    long_about = "Fngen turns a function definition (description, example scenarios, error conditions and output type) into a callable backed by an OpenAI-compatible model. Use it to preview prompts or invoke a definition directly."
)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to backend configuration file, read by `invoke` only
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the prompt a definition renders for an input
    #[command(about = "Render the prompt for an input without contacting a backend")]
    Prompt(FunctionArgs),

    /// Invoke a definition against the configured backend
    #[command(about = "Invoke a function definition and print the decoded result")]
    Invoke(InvokeArgs),
}

#[derive(Args, Debug)]
pub struct FunctionArgs {
    /// Function definition file
    #[arg(short, long, help = "TOML function definition")]
    pub definition: PathBuf,

    /// Input value, parsed as JSON when possible and as plain text otherwise
    #[arg(short, long, help = "Function input (JSON or plain text)")]
    pub input: String,
}

#[derive(Args, Debug)]
pub struct InvokeArgs {
    #[command(flatten)]
    pub function: FunctionArgs,

    /// Backend preset, ignored when a configuration file is given
    #[arg(short, long, value_enum, default_value_t = Provider::Openai)]
    pub provider: Provider,

    /// Recover JSON embedded in prose replies
    #[arg(long)]
    pub lenient: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    Openai,
    Llama,
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Openai => "openai",
            Provider::Llama => "llama",
        }
    }
}
