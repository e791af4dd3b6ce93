use crate::app::{App, ChartTab};
use crate::ui::widgets::format::{format_value, truncate_label};
use crate::ui::widgets::status::{render_empty, render_error, render_loading};
use crate::ui::widgets::tables::{render_series_table, visible_rows};
use co2_dashboard::dashboard::LoadState;
use co2_dashboard::normalize::NormalizedSeries;
use ratatui::layout::{Direction, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Tabs,
};
use ratatui::Frame;

const BAR_LABEL_WIDTH: usize = 18;
const BAR_COLORS: [Color; 4] = [Color::Cyan, Color::Green, Color::Yellow, Color::Magenta];

pub fn render_chart_tabs(app: &App, f: &mut Frame<'_>, area: Rect) {
    let titles = ChartTab::ALL
        .iter()
        .enumerate()
        .map(|(index, tab)| TextLine::from(format!("{} {}", index + 1, tab.label())))
        .collect::<Vec<_>>();

    let tabs = Tabs::new(titles)
        .select(app.chart_tab_index)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .divider(Span::raw("|"));

    f.render_widget(tabs, area);
}

/// Draws the selected resource in whichever state it is in.
pub fn render_chart_panel(app: &App, f: &mut Frame<'_>, area: Rect) {
    let tab = app.chart_tab();
    let title = tab.label();

    match app.dashboard.state(tab.resource()) {
        LoadState::Idle => render_empty(title, "Press F5 to load", f, area),
        LoadState::Loading => render_loading(title, &app.throbber_state, f, area),
        LoadState::Error(message) => render_error(title, message, f, area),
        LoadState::Ready(data) => match data.as_series() {
            None => render_empty(title, "Unexpected payload", f, area),
            Some(series) if series.is_empty() => {
                render_empty(title, "No data for the selected filters", f, area);
            }
            Some(series) => match tab {
                ChartTab::TimeSeries => render_line_chart(series, title, f, area),
                ChartTab::TopEmitters | ChartTab::Categories => {
                    render_bar_chart(series, title, f, area);
                }
                ChartTab::Regions | ChartTab::RegionCategory => {
                    app.table_rows.set(visible_rows(area));
                    render_series_table(series, title, app.table_offset, f, area);
                }
            },
        },
    }
}

/// Plot coordinates: numeric labels (years) become x, otherwise row order.
#[allow(clippy::cast_precision_loss)]
pub fn line_points(series: &NormalizedSeries) -> Vec<(f64, f64)> {
    let points = series.points();
    let numeric_labels = points
        .iter()
        .all(|(label, _)| label.trim().parse::<f64>().is_ok());

    let mut plotted: Vec<(f64, f64)> = points
        .iter()
        .enumerate()
        .map(|(index, (label, value))| {
            let x = if numeric_labels {
                label.trim().parse().unwrap_or(index as f64)
            } else {
                index as f64
            };
            (x, *value)
        })
        .collect();
    plotted.sort_by(|a, b| a.0.total_cmp(&b.0));
    plotted
}

fn bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    if (max - min).abs() < f64::EPSILON {
        return [min - 1.0, max + 1.0];
    }
    [min, max]
}

fn render_line_chart(series: &NormalizedSeries, title: &str, f: &mut Frame<'_>, area: Rect) {
    let data = line_points(series);
    let x_bounds = bounds(data.iter().map(|(x, _)| *x));
    let y_bounds = bounds(data.iter().map(|(_, y)| *y).chain(std::iter::once(0.0)));

    let datasets = vec![Dataset::default()
        .name(series.value_key.clone())
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&data)];

    let x_labels = vec![
        Span::raw(format!("{:.0}", x_bounds[0])),
        Span::raw(format!("{:.0}", x_bounds[1])),
    ];
    let y_labels = vec![
        Span::raw(format_value(y_bounds[0])),
        Span::raw(format_value(y_bounds[1])),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(format!(" {title} "))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .x_axis(
            Axis::default()
                .title(series.name_key.clone())
                .style(Style::default().fg(Color::Gray))
                .bounds(x_bounds)
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title(series.value_key.clone())
                .style(Style::default().fg(Color::Gray))
                .bounds(y_bounds)
                .labels(y_labels),
        );

    f.render_widget(chart, area);
}

/// Bar length in hundredths; negative values draw as empty bars.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bar_length(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        (value * 100.0).round() as u64
    } else {
        0
    }
}

fn render_bar_chart(series: &NormalizedSeries, title: &str, f: &mut Frame<'_>, area: Rect) {
    let points = series.points();
    // One row per bar inside the borders
    let visible = usize::from(area.height.saturating_sub(2));

    let bars: Vec<Bar<'_>> = points
        .iter()
        .take(visible)
        .enumerate()
        .map(|(index, (label, value))| {
            Bar::default()
                .value(bar_length(*value))
                .text_value(format_value(*value))
                .label(TextLine::from(truncate_label(label, BAR_LABEL_WIDTH)))
                .style(Style::default().fg(BAR_COLORS[index % BAR_COLORS.len()]))
                .value_style(
                    Style::default()
                        .fg(Color::Black)
                        .bg(BAR_COLORS[index % BAR_COLORS.len()])
                        .add_modifier(Modifier::BOLD),
                )
        })
        .collect();

    let max_value = bars_max(&points);

    let chart = BarChart::default()
        .block(
            Block::default()
                .title(format!(" {title} ({}) ", series.value_key))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .direction(Direction::Horizontal)
        .data(BarGroup::default().bars(&bars))
        .max(max_value)
        .bar_gap(0)
        .bar_width(1);

    f.render_widget(chart, area);
}

fn bars_max(points: &[(String, f64)]) -> u64 {
    points
        .iter()
        .map(|(_, value)| bar_length(*value))
        .max()
        .unwrap_or(0)
        .max(1)
}
