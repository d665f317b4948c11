mod components;

use std::sync::OnceLock;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Loadable, Popup, Section};
use crate::config::ThemeOverrides;
use crate::metrics::{format_count, percent_from_score, Metric};
use crate::theme::Theme;

use components::{draw_metric_chart, draw_user_list, interest_line};

// Theme is resolved once from config at startup
static THEME: OnceLock<Theme> = OnceLock::new();

pub fn init_theme(overrides: &ThemeOverrides) {
    let _ = THEME.set(Theme::load(overrides));
}

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

// Helper functions to get theme colors
fn accent() -> Color { theme().accent }
fn inactive() -> Color { theme().inactive }
fn success() -> Color { theme().success }
fn warning() -> Color { theme().warning }
fn danger() -> Color { theme().danger }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn bg_selected() -> Color { theme().bg_selected }
fn header() -> Color { theme().header }

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    // Charts get less room on short terminals
    let charts_height = if area.height < 30 {
        Constraint::Length(8)
    } else {
        Constraint::Percentage(35)
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1), // Info line
            Constraint::Length(4), // Simulation controls
            charts_height,         // Metric charts
            Constraint::Min(8),    // Selected user
            Constraint::Length(1), // Footer
        ])
        .split(area);

    draw_info_line(f, app, chunks[0]);
    draw_controls_box(f, app, chunks[1]);
    draw_charts(f, app, chunks[2]);
    draw_user_section(f, app, chunks[3]);
    draw_footer(f, app, chunks[4]);

    // Draw popups on top
    match app.popup {
        Popup::None => {}
        Popup::UserInput => draw_user_input(f, app),
        Popup::ConfirmReset => draw_confirm_popup(f),
        Popup::Help => draw_help_popup(f),
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    // Priority: status message > busy indicator > ready
    let line = if let Some(ref status) = app.status_message {
        Line::from(vec![
            Span::styled(status, Style::default().fg(warning())),
        ])
    } else if app.advancing_day {
        Line::from(vec![
            Span::styled("Simulating next day...", Style::default().fg(text_dim())),
        ])
    } else if app.resetting {
        Line::from(vec![
            Span::styled("Resetting simulation...", Style::default().fg(text_dim())),
        ])
    } else if app.loading_random_user {
        Line::from(vec![
            Span::styled("Picking a random user...", Style::default().fg(text_dim())),
        ])
    } else {
        Line::from(vec![
            Span::styled("Ready", Style::default().fg(text_dim())),
            Span::styled(" │ ", Style::default().fg(inactive())),
            Span::styled(app.client().base_url(), Style::default().fg(text_dim())),
        ])
    };

    let info = Paragraph::new(line).alignment(Alignment::Center);
    f.render_widget(info, area);
}

fn draw_controls_box(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(
            " Synthetic User Simulation ",
            Style::default().fg(accent()).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));

    let report = &app.last_report;
    let lines = vec![
        Line::from(vec![
            Span::styled(format!("Day {}", app.day), Style::default().fg(header()).add_modifier(Modifier::BOLD)),
            Span::styled("  │  ", Style::default().fg(inactive())),
            Span::styled(
                format!(
                    "+{} users, +{} friendships, {} interactions today",
                    format_count(report.new_users),
                    format_count(report.new_friendships),
                    format_count(report.total_interactions),
                ),
                Style::default().fg(text()),
            ),
            Span::styled("  │  ", Style::default().fg(inactive())),
            Span::styled(
                format!("{} users in network", format_count(app.total_users)),
                Style::default().fg(success()),
            ),
        ]),
        Line::from(vec![
            Span::styled("n", Style::default().fg(accent())),
            Span::styled(" next day  ", Style::default().fg(text_dim())),
            Span::styled("R", Style::default().fg(danger())),
            Span::styled(" reset  ", Style::default().fg(text_dim())),
            Span::styled("r", Style::default().fg(accent())),
            Span::styled(" random user  ", Style::default().fg(text_dim())),
            Span::styled("/", Style::default().fg(accent())),
            Span::styled(" user ID", Style::default().fg(text_dim())),
        ]),
    ];

    let content = Paragraph::new(lines).block(block);
    f.render_widget(content, area);
}

fn draw_charts(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    for (metric, chunk) in Metric::ALL.into_iter().zip(chunks.iter()) {
        draw_metric_chart(f, &app.history, metric, *chunk);
    }
}

fn draw_user_section(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40), // Profile
            Constraint::Percentage(60), // Friends + recommendations
        ])
        .split(area);

    draw_profile(f, app, chunks[0]);

    let lists = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(chunks[1]);

    let panels = [
        (Section::Friends, "Friends", &app.friends, "No friends found."),
        (Section::FriendsOfFriends, "Friends of Friends", &app.friends_of_friends, "No friends of friends found."),
        (Section::Strangers, "Suggested Users", &app.strangers, "No suggestions at this time."),
    ];

    for ((section, title, list, empty), chunk) in panels.into_iter().zip(lists.iter()) {
        draw_user_list(
            f,
            *chunk,
            title,
            list,
            empty,
            app.section == section,
            app.cursor(section),
        );
    }
}

fn draw_profile(f: &mut Frame, app: &App, area: Rect) {
    let title = match app.selected_user() {
        Some(id) => format!(" User #{} ", id),
        None => " User Profile ".to_string(),
    };
    let block = Block::default()
        .title(Span::styled(title, Style::default().fg(header())))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));

    let lines: Vec<Line> = match &app.profile {
        Loadable::Idle => vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("  Press ", Style::default().fg(text_dim())),
                Span::styled("r", Style::default().fg(accent())),
                Span::styled(" for a random user or ", Style::default().fg(text_dim())),
                Span::styled("/", Style::default().fg(accent())),
                Span::styled(" to enter an ID", Style::default().fg(text_dim())),
            ]),
        ],
        Loadable::Loading => vec![Line::styled("Loading profile...", Style::default().fg(text_dim()))],
        Loadable::Failed(msg) => vec![Line::styled(format!("Error: {}", msg), Style::default().fg(danger()))],
        Loadable::Loaded(profile) => {
            let mut lines = vec![
                Line::from(vec![
                    Span::styled(profile.display_name(), Style::default().fg(text()).add_modifier(Modifier::BOLD)),
                    Span::raw(" "),
                    Span::styled(profile.gender().glyph(), Style::default().fg(accent())),
                ]),
                Line::styled(
                    if profile.has_avatar() { "Avatar: yes" } else { "Avatar: none" },
                    Style::default().fg(text_dim()),
                ),
                Line::from(""),
                Line::styled("Interests", Style::default().fg(header()).add_modifier(Modifier::BOLD)),
            ];

            if profile.interests.is_empty() {
                lines.push(Line::styled("No interests", Style::default().fg(text_dim()).add_modifier(Modifier::ITALIC)));
            } else {
                let name_width = profile
                    .interests
                    .iter()
                    .map(|i| i.name.chars().count())
                    .max()
                    .unwrap_or(0)
                    .min(16);
                // Borders, name column and the percentage take the rest
                let bar_width = (area.width as usize)
                    .saturating_sub(name_width + 9)
                    .clamp(4, 30);
                for interest in &profile.interests {
                    let percent = percent_from_score(interest.score, app.config.max_interest_score);
                    lines.push(interest_line(&interest.name, percent, name_width, bar_width));
                }
            }

            lines.push(Line::from(""));
            lines.push(Line::styled("Tags", Style::default().fg(header()).add_modifier(Modifier::BOLD)));
            if profile.tags.is_empty() {
                lines.push(Line::styled("No tags", Style::default().fg(text_dim()).add_modifier(Modifier::ITALIC)));
            } else {
                let tags: Vec<Span> = profile
                    .tags
                    .iter()
                    .flat_map(|tag| {
                        vec![
                            Span::styled(format!("[{}]", tag), Style::default().fg(success())),
                            Span::raw(" "),
                        ]
                    })
                    .collect();
                lines.push(Line::from(tags));
            }
            lines
        }
    };

    let content = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(content, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let mut hints: Vec<(&str, &str)> = vec![
        ("n", "Day"),
        ("r", "Random"),
        ("/", "User"),
    ];
    if app.selection.is_some() {
        hints.extend([("Tab", "List"), ("↑↓", "Nav"), ("Enter", "Open"), ("x", "Clear")]);
    }
    hints.extend([("h", "Help"), ("q", "Quit")]);

    // Responsive: show fewer hints on narrow terminals
    let max_hints = if area.width < 60 { 4 } else if area.width < 80 { 6 } else { hints.len() };

    let hint_spans: Vec<Span> = hints
        .iter()
        .take(max_hints)
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(accent())),
                Span::styled(format!(" {} │ ", action), Style::default().fg(text_dim())),
            ]
        })
        .collect();

    let footer = Paragraph::new(Line::from(hint_spans))
        .alignment(Alignment::Center);

    f.render_widget(footer, area);
}

fn draw_user_input(f: &mut Frame, app: &App) {
    let popup_area = centered_rect(50, 30, f.area());

    f.render_widget(Clear, popup_area);

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  User ID: ", Style::default().fg(header())),
            Span::styled(format!("{}_", app.input_buffer), Style::default().fg(text())),
        ]),
        Line::from(Span::styled(
            format!("  Valid range: 1 to {}", app.total_users),
            Style::default().fg(text_dim()),
        )),
        Line::from(""),
    ];

    if let Some(ref error) = app.input_error {
        lines.push(Line::from(Span::styled(format!("  {}", error), Style::default().fg(danger()))));
    } else {
        lines.push(Line::from(vec![
            Span::styled("  Enter", Style::default().fg(success())),
            Span::styled(" view  ", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(danger())),
            Span::styled(" cancel", Style::default().fg(text_dim())),
        ]));
    }

    let input = Paragraph::new(lines).block(
        Block::default()
            .title(Span::styled(" View User ", Style::default().fg(accent())))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent())),
    );

    f.render_widget(input, popup_area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 70 },
        if area.height < 40 { 95 } else { 85 },
        area
    );

    f.render_widget(Clear, popup_area);

    let section = |title: &'static str| {
        Line::from(Span::styled(title, Style::default().fg(header()).add_modifier(Modifier::BOLD)))
    };
    let key = |k: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(k, Style::default().fg(accent())),
            Span::raw(desc),
        ])
    };

    let help_text = vec![
        section("═══ Simulation ═══"),
        key("  n         ", "Simulate the next day"),
        key("  R         ", "Reset the simulation (asks first)"),
        key("  u         ", "Refresh the user count"),
        Line::from(""),
        section("═══ Users ═══"),
        key("  r         ", "Load a random user"),
        key("  / or i    ", "Enter a user ID"),
        key("  x         ", "Clear the selected user"),
        Line::from(""),
        section("═══ Friends & Recommendations ═══"),
        key("  Tab       ", "Switch list (Friends → FOF → Suggested)"),
        key("  ↑/↓ j/k   ", "Move up/down in the list"),
        key("  Enter     ", "Open the highlighted user"),
        Line::from(""),
        section("═══ Command Line ═══"),
        key("  synthdash --status     ", "Print the user count as JSON"),
        key("  synthdash --step 7     ", "Simulate days, one JSON line each"),
        key("  synthdash --profile 42 ", "Print a profile as JSON"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(text_dim())),
            Span::styled("h", Style::default().fg(accent())),
            Span::styled("/", Style::default().fg(text_dim())),
            Span::styled("?", Style::default().fg(accent())),
            Span::styled("/", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" to close", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" synthdash Help ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

fn draw_confirm_popup(f: &mut Frame) {
    let popup_area = centered_rect(40, 20, f.area());

    f.render_widget(Clear, popup_area);

    let confirm = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("Reset the simulation to day 0?", Style::default().fg(warning()))),
        Line::from(""),
        Line::from(vec![
            Span::styled("  y", Style::default().fg(success()).add_modifier(Modifier::BOLD)),
            Span::raw(" Yes   "),
            Span::styled("n", Style::default().fg(danger()).add_modifier(Modifier::BOLD)),
            Span::raw(" No"),
        ]),
    ])
    .block(
        Block::default()
            .title(Span::styled(" Confirm ", Style::default().fg(warning())))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(warning())),
    )
    .alignment(Alignment::Center);

    f.render_widget(confirm, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
