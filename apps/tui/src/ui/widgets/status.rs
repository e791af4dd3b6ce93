use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use throbber_widgets_tui::{Throbber, ThrobberState, BRAILLE_SIX};

fn panel(title: &str, color: Color) -> Block<'static> {
    Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
}

/// Spinner inside a titled panel while a resource is in flight.
pub fn render_loading(title: &str, state: &ThrobberState, f: &mut Frame<'_>, area: Rect) {
    let block = panel(title, Color::Cyan);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let throbber = Throbber::default()
        .label("Loading...")
        .style(Style::default().fg(Color::Gray))
        .throbber_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .throbber_set(BRAILLE_SIX);

    let mut state = state.clone();
    f.render_stateful_widget(throbber, inner, &mut state);
}

/// Failure of a single resource; the rest of the dashboard stays usable.
pub fn render_error(title: &str, message: &str, f: &mut Frame<'_>, area: Rect) {
    let paragraph = Paragraph::new(format!("Error: {message}"))
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true })
        .block(panel(title, Color::Red));
    f.render_widget(paragraph, area);
}

pub fn render_empty(title: &str, message: &str, f: &mut Frame<'_>, area: Rect) {
    let paragraph = Paragraph::new(message.to_string())
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center)
        .block(panel(title, Color::Cyan));
    f.render_widget(paragraph, area);
}
