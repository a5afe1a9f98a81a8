//! jukeq-ui - Main entry point
//!
//! Terminal remote for a jukeq music-queue server: mirrors the server's
//! player/queue state over REST plus the push event channel and renders
//! it with ratatui. Playback itself happens on the server; this client
//! only observes and dispatches commands.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jukeq_common::config::UiConfig;
use jukeq_common::events::EventBus;
use jukeq_ui::api::ApiClient;
use jukeq_ui::app::{App, View};
use jukeq_ui::listener;

/// Command-line arguments for jukeq-ui
#[derive(Parser, Debug)]
#[command(name = "jukeq-ui")]
#[command(about = "Terminal remote for a jukeq music-queue server")]
#[command(version)]
struct Args {
    /// Server base URL (overrides JUKEQ_SERVER_URL and the config file)
    #[arg(short, long)]
    server: Option<String>,

    /// Start on the overlay view (mini-player + toasts)
    #[arg(long)]
    overlay: bool,

    /// Log file path (defaults to the platform data dir)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = UiConfig::resolve(args.server.as_deref());
    if args.log_file.is_some() {
        config.log_file = args.log_file.clone();
    }

    init_tracing(&config).context("Failed to initialize logging")?;
    info!("Starting jukeq-ui against {}", config.server_url);

    let api = ApiClient::new(&config.server_url).context("Failed to build HTTP client")?;
    let bus = EventBus::new(256);

    // Push-channel listener. If the channel drops, the task ends and the
    // UI keeps running on fetched state alone (no reconnection).
    let events_url = api.events_url();
    let listener_bus = bus.clone();
    tokio::spawn(async move {
        if let Err(e) = listener::run(events_url, listener_bus).await {
            warn!("Event listener ended: {}", e);
        }
    });

    let view = if args.overlay { View::Overlay } else { View::Queue };
    let app = App::new(api, bus, view);

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to build terminal")?;

    let result = app.run(&mut terminal).await;

    // Always restore the terminal, even when the loop failed
    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    result.context("UI loop failed")?;
    info!("Shutdown complete");
    Ok(())
}

/// Route tracing output to a file; stderr is unusable once the terminal
/// is in raw mode.
fn init_tracing(config: &UiConfig) -> Result<()> {
    let log_path = match &config.log_file {
        Some(path) => path.clone(),
        None => default_log_file()?,
    };
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open {}", log_path.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false),
        )
        .init();
    Ok(())
}

fn default_log_file() -> Result<PathBuf> {
    let dir = dirs::data_local_dir().context("Could not determine data directory")?;
    Ok(dir.join("jukeq").join("jukeq-ui.log"))
}
