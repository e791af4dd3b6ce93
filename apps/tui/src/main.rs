mod app;
mod cli;
mod event;
mod terminal;
mod ui;

use app::App;
use clap::Parser;
use cli::CliArgs;
use co2_dashboard::config::{self, AppConfig};
use color_eyre::Result;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    color_eyre::install()?;

    let cli = CliArgs::parse();
    cli.apply_env_overrides();
    let config = config::init_app_config()?;

    let headless = cli.headless || cli.json || !is_terminal();
    init_tracing(&config, headless)?;
    tracing::info!(api = %config.api_base_url, headless, "starting co2-dashboard");

    let mut app = App::new(config, cli.initial_filters())?;

    if headless {
        return event::run_headless(&mut app, cli.json).await;
    }

    let mut terminal = terminal::setup()?;
    let result = event::run(&mut terminal, &mut app).await;
    terminal::cleanup(true, true);

    result
}

/// Logs go to the configured file, to stderr when headless, and nowhere
/// otherwise so they never tear the TUI.
fn init_tracing(config: &AppConfig, headless: bool) -> Result<()> {
    let default_level = if config.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if let Some(path) = &config.log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if headless {
        builder.with_writer(std::io::stderr).init();
    } else {
        builder.with_writer(std::io::sink).init();
    }

    Ok(())
}

// Check if we're running in a terminal
fn is_terminal() -> bool {
    atty::is(atty::Stream::Stdout)
}
