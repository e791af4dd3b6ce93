use crate::ui::widgets::format::{format_value, truncate_label};
use co2_dashboard::normalize::{as_number, NormalizedSeries};
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};
use ratatui::Frame;
use serde_json::Value;

/// Columns shown besides the label column.
const MAX_EXTRA_COLUMNS: usize = 4;
const LABEL_WIDTH: usize = 32;

/// Data rows that fit in `area` once borders and the header are drawn.
pub fn visible_rows(area: Rect) -> usize {
    usize::from(area.height.saturating_sub(3))
}

/// First row index to draw so that the window never scrolls past the end.
pub const fn scroll_offset(total_rows: usize, visible_rows: usize, requested: usize) -> usize {
    if total_rows <= visible_rows {
        return 0;
    }
    let last_start = total_rows - visible_rows;
    if requested > last_start {
        last_start
    } else {
        requested
    }
}

/// Label column first, then the value column, then remaining fields of the first row.
pub fn table_columns(series: &NormalizedSeries) -> Vec<String> {
    let mut columns = vec![series.name_key.clone(), series.value_key.clone()];
    if let Some(Value::Object(first)) = series.rows.first() {
        columns.extend(
            first
                .keys()
                .filter(|key| !columns.contains(key))
                .take(MAX_EXTRA_COLUMNS.saturating_sub(1))
                .cloned()
                .collect::<Vec<_>>(),
        );
    }
    columns
}

fn cell_text(series: &NormalizedSeries, row: &Value, column: &str) -> String {
    if column == series.name_key {
        return truncate_label(&series.label(row), LABEL_WIDTH);
    }
    match row.get(column) {
        Some(Value::String(text)) => as_number(&Value::String(text.clone()))
            .map_or_else(|| truncate_label(text, LABEL_WIDTH), format_value),
        Some(value) => as_number(value).map_or_else(|| value.to_string(), format_value),
        None => "-".to_string(),
    }
}

pub fn render_series_table(
    series: &NormalizedSeries,
    title: &str,
    offset: usize,
    f: &mut Frame<'_>,
    area: Rect,
) {
    let columns = table_columns(series);
    let visible = visible_rows(area);
    let start = scroll_offset(series.len(), visible, offset);

    let header = Row::new(columns.iter().map(|column| Cell::from(column.clone()))).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows = series.rows.iter().skip(start).take(visible).map(|row| {
        Row::new(
            columns
                .iter()
                .map(|column| Cell::from(cell_text(series, row, column))),
        )
    });

    let widths = columns.iter().enumerate().map(|(index, _)| {
        if index == 0 {
            Constraint::Percentage(40)
        } else {
            Constraint::Fill(1)
        }
    });

    let position = if series.is_empty() {
        String::new()
    } else {
        format!(
            " {}-{} of {} ",
            start + 1,
            (start + visible).min(series.len()),
            series.len()
        )
    };

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(format!(" {title} "))
            .title_bottom(position)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(table, area);
}
