//! Terminal chat client for the gemchat backend.
//!
//! Usage:
//!   gemchat [--backend <URL>] [--delay-ms <MS>] [--no-health-check]

mod app;
mod handler;
mod logging;
mod markup;
mod tui;
mod ui;

use anyhow::Result;
use app::App;
use clap::Parser;
use gemchat_core::{ChatController, Config, HttpBackend};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tui::{ChannelSurface, EventHandler, Tui};

#[derive(Parser)]
#[command(name = "gemchat")]
#[command(about = "Chat with a Gemini backend from the terminal")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides GEMCHAT_BACKEND_URL and the config file)
    #[arg(short, long)]
    backend: Option<String>,

    /// Delay between revealed characters, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Skip the startup health probe
    #[arg(long)]
    no_health_check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = logging::init()?;

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "Could not load config, using defaults");
        Config::default()
    });

    let backend_url = config.backend_url(cli.backend.as_deref());
    let mut settings = config.controller_settings();
    if let Some(ms) = cli.delay_ms {
        settings.reveal_delay = Duration::from_millis(ms);
    }
    info!(log = %log_path.display(), "Starting gemchat");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, &cli, &config, &backend_url, settings).await;

    tui::restore()?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        error!(error = %e, "gemchat exited with an error");
    }
    result
}

async fn run(
    terminal: &mut Tui,
    cli: &Cli,
    config: &Config,
    backend_url: &str,
    settings: gemchat_core::ControllerSettings,
) -> Result<()> {
    let mut events = EventHandler::new();

    let surface = Arc::new(ChannelSurface::new(events.sender()));
    let backend = Arc::new(HttpBackend::new(backend_url));
    info!(base_url = backend.base_url(), "Using chat backend");
    let controller = ChatController::new(backend, surface).with_settings(settings);

    let mut app = App::new(controller.clone(), config.theme(), events.sender());

    if !cli.no_health_check {
        tokio::spawn(async move {
            controller.check_backend().await;
        });
    }

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event),
            None => break,
        }
    }

    app.stop();
    Ok(())
}
