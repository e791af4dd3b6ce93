use crate::cli::CliArgs;
use crate::ui::widgets::popup::{bottom_line, centered_rect};
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

const KEYS: &[(&str, &str)] = &[
    ("?/F1", "Toggle this help popup"),
    ("y", "Choose year"),
    ("r", "Choose region"),
    ("c", "Choose category"),
    ("x", "Reset every filter to all"),
    ("F5/R", "Refresh all resources"),
    ("Left/Right", "Switch chart tab"),
    ("1-5", "Jump to chart tab"),
    ("Up/Down", "Scroll tables"),
    ("PgUp/PgDn", "Scroll tables by a page"),
    ("q", "Quit application"),
];

const PICKER_KEYS: &[(&str, &str)] = &[
    ("type", "Narrow the list (fuzzy)"),
    ("Up/Down", "Move selection"),
    ("Enter", "Apply filter"),
    ("Esc", "Close without changes"),
];

pub fn render_help_popup(f: &mut Frame<'_>, area: Rect) {
    let popup_area = centered_rect(80, 80, area);
    f.render_widget(Clear, popup_area);

    let help_block = Block::default()
        .title("== Help & Keyboard Shortcuts ==")
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let help_paragraph = Paragraph::new(Text::from(build_help_lines()))
        .block(help_block)
        .wrap(Wrap { trim: false });
    f.render_widget(help_paragraph, popup_area);

    let hint = Paragraph::new(Span::styled(
        "Press ? or Esc to close",
        Style::default().fg(Color::Gray),
    ))
    .alignment(Alignment::Center);
    f.render_widget(hint, bottom_line(popup_area));
}

fn key_line(key: &'static str, action: &'static str) -> TextLine<'static> {
    TextLine::from(vec![
        Span::styled(
            format!("  {key:<12}"),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(action),
    ])
}

fn heading(text: &'static str) -> TextLine<'static> {
    TextLine::from(Span::styled(
        text,
        Style::default().add_modifier(Modifier::BOLD),
    ))
}

fn build_help_lines() -> Vec<TextLine<'static>> {
    let mut lines = vec![
        TextLine::from(Span::styled(
            "CO2 Emissions Dashboard",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        TextLine::from(""),
        TextLine::from(
            "Browse emission statistics by year, region and category. Every filter change refetches all panels.",
        ),
        TextLine::from(""),
        heading("Dashboard:"),
    ];
    lines.extend(KEYS.iter().map(|(key, action)| key_line(key, action)));

    lines.push(TextLine::from(""));
    lines.push(heading("Filter picker:"));
    lines.extend(PICKER_KEYS.iter().map(|(key, action)| key_line(key, action)));

    lines.push(TextLine::from(""));
    lines.push(heading("CLI Options:"));
    let help_text = CliArgs::help_text();
    for line in help_text.lines() {
        if line.starts_with("Usage") || line.starts_with("Options") || line.trim().is_empty() {
            continue;
        }
        lines.push(TextLine::from(line.to_string()));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_lists_filter_keys_and_cli_flags() {
        let text: Vec<String> = build_help_lines()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert!(text.iter().any(|line| line.contains("Choose region")));
        assert!(text.iter().any(|line| line.contains("--headless")));
    }
}
