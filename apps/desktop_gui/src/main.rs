use std::path::PathBuf;

use clap::Parser;
use client_core::{
    config::{load_settings_from, SETTINGS_FILE},
    BackendKind,
};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

mod backend_bridge;
mod controller;
mod ui;

use backend_bridge::commands::BackendCommand;
use controller::events::UiEvent;
use ui::CarQuizApp;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = SETTINGS_FILE)]
    config: PathBuf,
    #[arg(long)]
    backend: Option<BackendKind>,
    #[arg(long)]
    gateway_url: Option<String>,
    #[arg(long)]
    canister_id: Option<String>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let args = Args::parse();

    let mut settings = load_settings_from(&args.config);
    if let Some(backend) = args.backend {
        settings.backend = backend;
    }
    if let Some(gateway_url) = args.gateway_url {
        settings.gateway_url = gateway_url;
    }
    if let Some(canister_id) = args.canister_id {
        settings.canister_id = canister_id;
    }
    let advance_delay = settings.advance_delay();

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    backend_bridge::runtime::launch(cmd_rx, ui_tx, settings);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Guess the Car Price")
            .with_inner_size([720.0, 760.0])
            .with_min_inner_size([420.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Guess the Car Price",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(CarQuizApp::bootstrap(
                cmd_tx,
                ui_rx,
                advance_delay,
            )))
        }),
    )
}
