use crate::app::App;
use crate::ui::widgets::charts::{render_chart_panel, render_chart_tabs};
use crate::ui::widgets::format::{format_count, format_optional};
use crate::ui::widgets::status::{render_error, render_loading};
use co2_dashboard::dashboard::{LoadState, ResourceKind};
use co2_dashboard::normalize::GeneralSummary;
use co2_dashboard::FilterField;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

pub fn render_dashboard(app: &App, f: &mut Frame<'_>) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(3), // Filters
            Constraint::Length(4), // Summary
            Constraint::Min(6),    // Charts
            Constraint::Length(3), // Status
            Constraint::Length(1), // Shortcuts hint
        ])
        .split(f.area().inner(Margin::new(1, 0)));

    render_title_section(app, f, layout[0]);
    render_filter_bar(app, f, layout[1]);
    render_summary(app, f, layout[2]);

    if app.dashboard.connection_failed() {
        render_connection_error(app, f, layout[3]);
    } else {
        let chart_split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(4)])
            .split(layout[3]);
        render_chart_tabs(app, f, chart_split[0]);
        render_chart_panel(app, f, chart_split[1]);
    }

    render_status_section(app, f, layout[4]);
    render_shortcuts(f, layout[5]);
}

fn render_title_section(app: &App, f: &mut Frame<'_>, area: Rect) {
    let title_block = Block::default()
        .title("== CO2 Emissions Dashboard ==")
        .title_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let health = match &app.health {
        Some(health) if health.is_healthy() => {
            Span::styled(format!("[{}]", health.status), Style::default().fg(Color::Green))
        }
        Some(health) => Span::styled(
            format!("[{}]", health.status),
            Style::default().fg(Color::Yellow),
        ),
        None => Span::styled("[health unknown]", Style::default().fg(Color::Gray)),
    };

    let refreshed = app.last_refreshed.map_or_else(
        || "never refreshed".to_string(),
        |at| format!("refreshed {}", at.format("%H:%M:%S")),
    );

    let line = TextLine::from(vec![
        Span::styled("Service ", Style::default().fg(Color::Gray)),
        Span::styled(
            app.client.base_url().to_string(),
            Style::default().fg(Color::White),
        ),
        Span::raw(" "),
        health,
        Span::styled(format!("  {refreshed}"), Style::default().fg(Color::Gray)),
    ]);

    f.render_widget(Paragraph::new(line).block(title_block), area);
}

fn render_filter_bar(app: &App, f: &mut Frame<'_>, area: Rect) {
    let filters = app.dashboard.filters();
    let mut spans = Vec::new();

    for (index, field) in FilterField::ORDERED.iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
        }
        let value_style = if filters.is_active(*field) {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(
            format!("{}: ", field.label()),
            Style::default().fg(Color::Gray),
        ));
        spans.push(Span::styled(filters.get(*field).to_string(), value_style));
    }

    let block = Block::default()
        .title(" Filters ")
        .title_style(Style::default().fg(Color::Green))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    f.render_widget(Paragraph::new(TextLine::from(spans)).block(block), area);
}

fn summary_lines(summary: &GeneralSummary) -> Vec<TextLine<'static>> {
    let label = Style::default().fg(Color::Gray);
    let value = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);

    let years = match (summary.min_year, summary.max_year) {
        (Some(from), Some(to)) => format!("{from:.0}-{to:.0}"),
        _ => "-".to_string(),
    };

    vec![
        TextLine::from(vec![
            Span::styled("Total: ", label),
            Span::styled(format_optional(summary.total), value),
            Span::styled("   Average: ", label),
            Span::styled(format_optional(summary.average), value),
        ]),
        TextLine::from(vec![
            Span::styled("Records: ", label),
            Span::styled(summary.count.map_or_else(|| "-".to_string(), format_count), value),
            Span::styled("   Years: ", label),
            Span::styled(years, value),
        ]),
    ]
}

fn render_summary(app: &App, f: &mut Frame<'_>, area: Rect) {
    let title = ResourceKind::General.label();
    match app.dashboard.state(ResourceKind::General) {
        LoadState::Idle | LoadState::Loading => {
            render_loading(title, &app.throbber_state, f, area);
        }
        LoadState::Error(message) => render_error(title, message, f, area),
        LoadState::Ready(data) => {
            let lines = data.as_summary().map_or_else(
                || vec![TextLine::from("No summary available")],
                summary_lines,
            );
            let block = Block::default()
                .title(format!(" {title} "))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan));
            f.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
        }
    }
}

fn render_connection_error(app: &App, f: &mut Frame<'_>, area: Rect) {
    let (title, headline, hint) = if app.dashboard.service_unreachable() {
        (
            " Connection Error ",
            "Cannot reach the statistics service".to_string(),
            "Check that the service is running, or set CO2_API_URL / --api-url.",
        )
    } else {
        let detail = match app.dashboard.state(ResourceKind::General) {
            LoadState::Error(message) => message.clone(),
            _ => String::new(),
        };
        (
            " Service Error ",
            format!("The statistics service failed: {detail}"),
            "The service is up but could not answer; its data may still be loading.",
        )
    };

    let lines = vec![
        TextLine::from(Span::styled(
            headline,
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        TextLine::from(""),
        TextLine::from(format!("Tried {}", app.client.base_url())),
        TextLine::from(hint),
        TextLine::from(""),
        TextLine::from(Span::styled(
            "Press F5 to retry",
            Style::default().fg(Color::Yellow),
        )),
    ];

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn render_status_section(app: &App, f: &mut Frame<'_>, area: Rect) {
    let status_block = Block::default()
        .title(" Status ")
        .title_style(Style::default().fg(Color::Yellow))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let style = if app.status_message.starts_with("Error") {
        Style::default().fg(Color::Red)
    } else if app.dashboard.is_loading() {
        Style::default().fg(Color::Gray)
    } else {
        Style::default().fg(Color::Green)
    };

    let status_paragraph = Paragraph::new(Span::styled(app.status_message.as_str(), style))
        .block(status_block)
        .wrap(Wrap { trim: true });
    f.render_widget(status_paragraph, area);
}

fn render_shortcuts(f: &mut Frame<'_>, area: Rect) {
    let key = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let text = Style::default().fg(Color::Gray);

    let spans: Vec<Span<'static>> = [
        ("?", "Help"),
        ("y/r/c", "Filter"),
        ("x", "Reset"),
        ("F5", "Refresh"),
        ("←/→", "Tab"),
        ("q", "Quit"),
    ]
    .iter()
    .enumerate()
    .flat_map(|(index, (shortcut, action))| {
        let separator = if index == 0 { "" } else { " | " };
        [
            Span::styled(separator, text),
            Span::styled(*shortcut, key),
            Span::styled(format!(": {action}"), text),
        ]
    })
    .collect();

    f.render_widget(
        Paragraph::new(TextLine::from(spans)).alignment(Alignment::Center),
        area,
    );
}
