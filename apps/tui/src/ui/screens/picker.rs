use crate::app::App;
use crate::ui::widgets::popup::{bottom_line, centered_rect};
use crate::ui::widgets::tables::scroll_offset;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph};
use ratatui::Frame;

pub fn render_picker_popup(app: &App, f: &mut Frame<'_>, area: Rect) {
    let Some(picker) = &app.picker else {
        return;
    };

    let popup_area = centered_rect(50, 60, area);
    f.render_widget(Clear, popup_area);

    let current = app.dashboard.filters().get(picker.field);
    let block = Block::default()
        .title(format!(" Choose {} ", picker.field.label()))
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    f.render_widget(block, popup_area);

    let inner = popup_area.inner(Margin::new(1, 1));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(inner);

    let query = Paragraph::new(TextLine::from(vec![
        Span::styled("Search: ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("{}_", picker.query),
            Style::default().fg(Color::White),
        ),
    ]));
    f.render_widget(query, chunks[0]);

    let choices = app.picker_choices();
    let list_area = chunks[1];
    if choices.is_empty() {
        let empty = Paragraph::new("No matches")
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(empty, list_area);
    } else {
        // Leave the last line for the hint
        let visible = usize::from(list_area.height.saturating_sub(1)).max(1);
        let start = scroll_offset(
            choices.len(),
            visible,
            (picker.selected + 1).saturating_sub(visible),
        );

        let items: Vec<ListItem<'_>> = choices
            .iter()
            .enumerate()
            .skip(start)
            .take(visible)
            .map(|(index, choice)| {
                let marker = if choice == current { "* " } else { "  " };
                let style = if index == picker.selected {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                ListItem::new(format!("{marker}{choice}")).style(style)
            })
            .collect();

        f.render_widget(List::new(items), list_area);
    }

    let hint = Paragraph::new(Span::styled(
        "Enter: apply | Esc: cancel",
        Style::default().fg(Color::Gray),
    ))
    .alignment(Alignment::Center);
    f.render_widget(hint, bottom_line(popup_area));
}
