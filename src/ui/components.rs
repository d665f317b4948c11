//! Reusable UI pieces: metric charts, user lists and interest bars

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Row, Table},
    Frame,
};

use super::{accent, bg_selected, danger, header, inactive, text, text_dim, theme};
use crate::api::types::SimpleProfile;
use crate::app::Loadable;
use crate::metrics::{format_count, ActivityHistory, Metric};

/// Line chart of one metric with its running total and today's delta
pub fn draw_metric_chart(f: &mut Frame, history: &ActivityHistory, metric: Metric, area: Rect) {
    let color = theme().metric(metric);
    let block = Block::default()
        .title(Span::styled(
            format!(" {} ", metric.title()),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(3)])
        .split(inner);

    let summary = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("Total: {}", format_count(history.total(metric))),
            Style::default().fg(text()).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("+{} today", format_count(history.latest(metric))),
            Style::default().fg(text_dim()),
        )),
    ])
    .alignment(Alignment::Right);
    f.render_widget(summary, chunks[0]);

    if history.is_empty() {
        let empty = Paragraph::new("No days simulated yet")
            .style(Style::default().fg(text_dim()))
            .alignment(Alignment::Center);
        f.render_widget(empty, chunks[1]);
        return;
    }

    let points = history.series(metric);
    let days = history.len().max(2) as f64;
    let y_max = (history.max(metric) as f64 * 1.1).max(1.0);

    let dataset = Dataset::default()
        .name(metric.title())
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .x_axis(
            Axis::default()
                .style(Style::default().fg(inactive()))
                .bounds([1.0, days])
                .labels(vec![
                    Span::raw("Day 1"),
                    Span::raw(format!("Day {}", history.len())),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(inactive()))
                .bounds([0.0, y_max])
                .labels(vec![Span::raw("0"), Span::raw(format_count(y_max.round() as u64))]),
        )
        .legend_position(None);

    f.render_widget(chart, chunks[1]);
}

/// List of users with per-panel loading, error and empty states
pub fn draw_user_list(
    f: &mut Frame,
    area: Rect,
    title: &str,
    list: &Loadable<Vec<SimpleProfile>>,
    empty_message: &str,
    is_active: bool,
    cursor: usize,
) {
    let border_color = if is_active { accent() } else { inactive() };
    let title_style = if is_active {
        Style::default().fg(accent()).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(inactive())
    };
    let count = list.loaded().map(|v| format!(" ({})", v.len())).unwrap_or_default();

    let block = Block::default()
        .title(Span::styled(format!(" {}{} ", title, count), title_style))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let profiles = match list {
        Loadable::Idle => {
            f.render_widget(Paragraph::new("").block(block), area);
            return;
        }
        Loadable::Loading => {
            let p = Paragraph::new("Loading...")
                .style(Style::default().fg(text_dim()))
                .block(block);
            f.render_widget(p, area);
            return;
        }
        Loadable::Failed(msg) => {
            let p = Paragraph::new(format!("Error: {}", msg))
                .style(Style::default().fg(danger()))
                .wrap(ratatui::widgets::Wrap { trim: true })
                .block(block);
            f.render_widget(p, area);
            return;
        }
        Loadable::Loaded(profiles) => profiles,
    };

    if profiles.is_empty() {
        let p = Paragraph::new(empty_message)
            .style(Style::default().fg(text_dim()))
            .block(block);
        f.render_widget(p, area);
        return;
    }

    // Keep the cursor row visible
    let visible = area.height.saturating_sub(3) as usize;
    let offset = if visible > 0 && cursor >= visible { cursor + 1 - visible } else { 0 };

    let rows: Vec<Row> = profiles
        .iter()
        .enumerate()
        .skip(offset)
        .map(|(i, user)| {
            let style = if is_active && i == cursor {
                Style::default().bg(bg_selected()).fg(text())
            } else {
                Style::default()
            };
            Row::new(vec![
                Span::styled(format!("#{}", user.user_id), Style::default().fg(text_dim())),
                Span::styled(user.display_name(), Style::default().fg(text())),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(rows, [Constraint::Length(8), Constraint::Min(8)])
        .header(Row::new(vec![
            Span::styled("ID", Style::default().fg(header())),
            Span::styled("Name", Style::default().fg(header())),
        ]))
        .block(block);

    f.render_widget(table, area);
}

/// Text bar like `music  ██████░░░░ 60%`
pub fn interest_line(name: &str, percent: u16, name_width: usize, bar_width: usize) -> Line<'static> {
    let filled = (percent as usize * bar_width + 50) / 100;
    let filled = filled.min(bar_width);
    Line::from(vec![
        Span::styled(
            format!("{:<width$} ", name, width = name_width),
            Style::default().fg(text()),
        ),
        Span::styled("█".repeat(filled), Style::default().fg(accent())),
        Span::styled("░".repeat(bar_width - filled), Style::default().fg(inactive())),
        Span::styled(format!(" {:>3}%", percent), Style::default().fg(text_dim())),
    ])
}
