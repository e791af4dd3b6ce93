use color_eyre::eyre::eyre;
use color_eyre::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::Stdout;

use crate::app::{handle_input, App};
use crate::ui;
use co2_dashboard::dashboard::{LoadState, ResourceKind};
use co2_dashboard::normalize::GeneralSummary;

/// Rows printed per resource in headless mode.
const HEADLESS_ROWS: usize = 10;

/// Run the application in headless mode (no UI)
pub async fn run_headless(app: &mut App, json: bool) -> Result<()> {
    app.start();
    app.wait_for_refresh().await;
    app.wait_for_startup().await;

    let report = build_headless_report(app);

    if json {
        let json = serde_json::to_string_pretty(&report)?;
        println!("{json}");
    } else {
        render_headless_report(&report);
    }

    if app.dashboard.service_unreachable() {
        return Err(eyre!(
            "Could not reach the statistics service at {}",
            app.client.base_url()
        ));
    }
    if app.dashboard.connection_failed() {
        return Err(eyre!(
            "The statistics service at {} answered with an error",
            app.client.base_url()
        ));
    }

    Ok(())
}

fn render_headless_report(report: &HeadlessReport) {
    println!("\nCO2 Emissions Stats");
    println!("===================");
    println!("Service: {}", report.service);
    if let Some(status) = &report.health {
        println!("Health: {status}");
    }
    println!("Filters: {}", report.filters);

    if report.connection_failed {
        println!("\nConnection error: general statistics are unavailable.");
        return;
    }

    if let Some(summary) = &report.summary {
        println!("\nSummary:");
        print_figure("Total", summary.total);
        print_figure("Average", summary.average);
        print_figure("Records", summary.count);
        if let (Some(from), Some(to)) = (summary.min_year, summary.max_year) {
            println!("- Years: {from:.0} - {to:.0}");
        }
    }

    for section in &report.sections {
        println!("\n{} ({}):", section.resource, section.status);
        for (label, value) in &section.rows {
            println!("- {label}: {value:.2}");
        }
    }
}

fn print_figure(label: &str, value: Option<f64>) {
    if let Some(value) = value {
        println!("- {label}: {value:.2}");
    }
}

fn build_headless_report(app: &App) -> HeadlessReport {
    let dashboard = &app.dashboard;

    let sections = ResourceKind::ALL
        .iter()
        .filter(|kind| **kind != ResourceKind::General)
        .map(|kind| {
            let state = dashboard.state(*kind);
            let status = match state {
                LoadState::Idle => "idle".to_string(),
                LoadState::Loading => "loading".to_string(),
                LoadState::Ready(_) => "ok".to_string(),
                LoadState::Error(message) => format!("error: {message}"),
            };
            let rows = dashboard
                .series(*kind)
                .map(|series| {
                    series
                        .points()
                        .into_iter()
                        .take(HEADLESS_ROWS)
                        .collect()
                })
                .unwrap_or_default();

            HeadlessSection {
                resource: kind.label().to_string(),
                status,
                rows,
            }
        })
        .collect();

    HeadlessReport {
        service: app.client.base_url().to_string(),
        health: app.health.as_ref().map(|health| health.status.clone()),
        filters: dashboard.filters().describe(),
        connection_failed: dashboard.connection_failed(),
        summary: dashboard.summary().copied(),
        sections,
    }
}

#[derive(serde::Serialize)]
struct HeadlessReport {
    service: String,
    health: Option<String>,
    filters: String,
    connection_failed: bool,
    summary: Option<GeneralSummary>,
    sections: Vec<HeadlessSection>,
}

#[derive(serde::Serialize)]
struct HeadlessSection {
    resource: String,
    status: String,
    rows: Vec<(String, f64)>,
}

/// Run the main application event loop
pub async fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    // Configure event poll timeout (ms)
    const EVENT_POLL_TIMEOUT: u64 = 50;

    // Options and health arrive through drain_outcomes.
    app.start();

    loop {
        app.update();
        app.drain_outcomes();

        if let Err(e) = terminal.draw(|f| ui::ui(app, f)) {
            return Err(eyre!("Terminal draw error: {e}"));
        }

        if matches!(
            event::poll(std::time::Duration::from_millis(EVENT_POLL_TIMEOUT)),
            Ok(true)
        ) {
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    handle_input(app, key.code);
                    if !app.running {
                        break;
                    }
                }
                Ok(Event::Resize(_, _)) => {
                    // Force a redraw after resize
                    if terminal.draw(|f| ui::ui(app, f)).is_err() {
                        tracing::debug!("redraw after resize failed");
                    }
                }
                Ok(_) | Err(_) => {
                    // Ignore non-key events for now
                }
            }
        }
    }
    Ok(())
}
