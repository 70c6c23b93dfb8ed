mod cli;
mod commands;
mod dataset;
mod llm;
mod prompts;
mod segment;
mod submission;

use clap::Parser;
use tracing::Level;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    // Load env
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    match cli.command {
        Commands::Predict(args) => commands::predict::run(args).await,
        Commands::Fix(args) => commands::fix::run(args),
        Commands::Check(args) => commands::check::run(args).await,
    }
}
