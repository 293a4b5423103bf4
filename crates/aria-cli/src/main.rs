//! Aria's command-line entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;
mod repl;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "aria", version, about = "A conversational assistant dialog engine")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "aria.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the interactive text REPL (the default).
    Run,
    /// Classify a single utterance and print the intent tag.
    Classify {
        /// The utterance to classify.
        text: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => repl::run(config).await,
        Command::Classify { text } => {
            let utterance = aria_nlu::normalize(&text.join(" "));
            println!("{}", aria_engine::classify(&utterance));
            Ok(())
        }
    }
}
