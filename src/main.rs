// src/main.rs

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use rinna_chat::cli::{Cli, Commands, run_chat, run_dataset, run_prompt, run_serve};
use rinna_chat::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (from ~/.rinna-chat/.env or current dir)
    let env_path = dirs::home_dir()
        .map(|h| h.join(".rinna-chat").join(".env"))
        .filter(|p| p.exists());
    if let Some(path) = env_path {
        let _ = dotenvy::from_path(&path);
    } else {
        let _ = dotenvy::dotenv();
    }

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rinna_chat=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    // CLI args > env vars (handled by clap) > config file > defaults
    let settings = Settings::load(cli.model.overrides());

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_serve(settings).await,
        Commands::Chat => run_chat(settings).await,
        Commands::Prompt { instruction, input } => {
            run_prompt(&instruction, input.as_deref());
            Ok(())
        }
        Commands::Dataset { input, output } => run_dataset(&input, &output),
    }
}
