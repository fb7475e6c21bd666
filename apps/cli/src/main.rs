use std::{io, path::PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::{
    config::{load_settings_from, SETTINGS_FILE},
    BackendKind, QuizClient,
};
use shared::protocol::SERVICE_INTERFACE;
use tracing_subscriber::EnvFilter;

mod play;

use play::TerminalGame;

#[derive(Parser, Debug)]
#[command(about = "Guess the price of each car")]
struct Cli {
    #[arg(long, default_value = SETTINGS_FILE)]
    config: PathBuf,
    #[arg(long)]
    backend: Option<BackendKind>,
    #[arg(long)]
    gateway_url: Option<String>,
    #[arg(long)]
    canister_id: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a round in the terminal (default).
    Play,
    /// Fetch the questions and print them as JSON.
    Questions,
    /// Print the remote service interface.
    Interface,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings_from(&cli.config);
    if let Some(backend) = cli.backend {
        settings.backend = backend;
    }
    if let Some(gateway_url) = cli.gateway_url {
        settings.gateway_url = gateway_url;
    }
    if let Some(canister_id) = cli.canister_id {
        settings.canister_id = canister_id;
    }

    match cli.command.unwrap_or(Command::Play) {
        Command::Interface => {
            print!("{SERVICE_INTERFACE}");
        }
        Command::Questions => {
            let client = QuizClient::new(settings.build_backend()?);
            let questions = client.fetch_questions().await?;
            println!("{}", serde_json::to_string_pretty(&questions)?);
        }
        Command::Play => {
            let client = QuizClient::new(settings.build_backend()?);
            tracing::info!(backend = %client.backend_label(), "starting terminal game");
            let stdin = io::stdin();
            let mut game = TerminalGame::new(stdin.lock(), io::stdout(), settings.advance_delay());
            game.run(&client).await?;
        }
    }

    Ok(())
}
