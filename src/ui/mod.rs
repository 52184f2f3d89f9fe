use std::sync::OnceLock;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, LogEntry, Popup, Section};
use crate::fragment;
use crate::session::SessionState;
use crate::theme::Theme;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Install the theme before the first draw; later calls are ignored
pub fn init_theme(theme: Theme) {
    let _ = THEME.set(theme);
}

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

// Helper functions to get theme colors
fn accent() -> Color { theme().accent }
fn success() -> Color { theme().success }
fn danger() -> Color { theme().danger }
fn warning() -> Color { theme().warning }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn inactive() -> Color { theme().inactive }
fn bg_selected() -> Color { theme().bg_selected }
fn header() -> Color { theme().header }

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1), // Info line
            Constraint::Length(4), // Session box
            Constraint::Length(5), // Slider box
            Constraint::Min(5),    // Message log
            Constraint::Length(1), // Footer
        ])
        .split(area);

    draw_info_line(f, app, chunks[0]);
    draw_session_box(f, app, chunks[1]);
    draw_slider_box(f, app, chunks[2]);
    draw_messages_box(f, app, chunks[3]);
    draw_footer(f, app, chunks[4]);

    // Draw popups on top
    match app.popup {
        Popup::None => {}
        Popup::Help => draw_help_popup(f),
        Popup::Fragment => draw_fragment_popup(f, app),
    }
}

fn state_color(state: SessionState) -> Color {
    match state {
        SessionState::Open => success(),
        SessionState::Connecting => warning(),
        SessionState::Errored => danger(),
        SessionState::Idle | SessionState::Closed => text_dim(),
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    // Priority: status message > state-derived info
    let line = if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status, Style::default().fg(warning())))
    } else {
        let info = match app.session_state {
            SessionState::Idle => "Press 'c' to connect".to_string(),
            SessionState::Connecting => format!("Connecting to {}...", app.server_url),
            SessionState::Open => format!(
                "{} │ sent {} │ received {}",
                app.server_url, app.sent_count, app.received_count
            ),
            SessionState::Closed => "Connection closed - 'c' to reconnect".to_string(),
            SessionState::Errored => app
                .last_error
                .clone()
                .unwrap_or_else(|| "Connection error".to_string()),
        };
        Line::from(Span::styled(info, Style::default().fg(text_dim())))
    };

    let info = Paragraph::new(line).alignment(Alignment::Center);
    f.render_widget(info, area);
}

fn draw_session_box(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(" Session ", Style::default().fg(inactive())))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));

    let state = app.session_state;
    let lines = vec![
        Line::from(vec![
            Span::styled("Server  ", Style::default().fg(header())),
            Span::styled(&app.server_url, Style::default().fg(text())),
        ]),
        Line::from(vec![
            Span::styled("State   ", Style::default().fg(header())),
            Span::styled("● ", Style::default().fg(state_color(state))),
            Span::styled(
                state.label(),
                Style::default()
                    .fg(state_color(state))
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
    ];

    let content = Paragraph::new(lines).block(block);
    f.render_widget(content, area);
}

fn draw_slider_box(f: &mut Frame, app: &App, area: Rect) {
    let is_active = app.section == Section::Slider;
    let border_color = if is_active { accent() } else { inactive() };
    let title_style = if is_active {
        Style::default().fg(accent()).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(inactive())
    };

    let block = Block::default()
        .title(Span::styled(" Slider ", title_style))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(accent()).bg(bg_selected()))
        .ratio(app.slider.ratio())
        .label(Span::styled(
            app.slider.wire_value(),
            Style::default().fg(text()).add_modifier(Modifier::BOLD),
        ));
    f.render_widget(gauge, rows[0]);

    let range = Paragraph::new(Line::from(vec![
        Span::styled(format!("{}", app.slider.min()), Style::default().fg(text_dim())),
        Span::styled(" ── ", Style::default().fg(inactive())),
        Span::styled(
            app.slider.wire_value(),
            Style::default().fg(if is_active { accent() } else { text() }),
        ),
        Span::styled(" ── ", Style::default().fg(inactive())),
        Span::styled(format!("{}", app.slider.max()), Style::default().fg(text_dim())),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(range, rows[1]);
}

fn draw_messages_box(f: &mut Frame, app: &App, area: Rect) {
    let is_active = app.section == Section::Messages;
    let border_color = if is_active { accent() } else { inactive() };
    let title_style = if is_active {
        Style::default().fg(accent()).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(inactive())
    };

    let title = format!(" Messages ({}) ", app.log.len());
    let block = Block::default()
        .title(Span::styled(title, title_style))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    if app.log.is_empty() {
        let empty = Paragraph::new("  Nothing received yet")
            .style(Style::default().fg(text_dim()))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    // Newest entries at the bottom; log_scroll counts entries scrolled up
    let inner_height = area.height.saturating_sub(2) as usize;
    let scroll = app.log_scroll.min(app.log.len().saturating_sub(1));
    let end = app.log.len() - scroll;
    let start = end.saturating_sub(inner_height);

    let lines: Vec<Line> = app
        .log
        .iter()
        .skip(start)
        .take(end - start)
        .map(render_log_entry)
        .collect();

    let content = Paragraph::new(lines).block(block);
    f.render_widget(content, area);
}

fn render_log_entry(entry: &LogEntry) -> Line<'_> {
    match entry {
        LogEntry::Inbound(summary) => Line::from(vec![
            Span::styled("« ", Style::default().fg(success())),
            Span::styled(summary.as_str(), Style::default().fg(text())),
        ]),
        LogEntry::Malformed { raw, error } => Line::from(vec![
            Span::styled("✗ ", Style::default().fg(danger())),
            Span::styled(raw.as_str(), Style::default().fg(text_dim())),
            Span::styled(format!("  ({})", error), Style::default().fg(danger())),
        ]),
        LogEntry::Binary { len } => Line::from(Span::styled(
            format!("· binary frame ({} bytes)", len),
            Style::default().fg(text_dim()),
        )),
        LogEntry::Lifecycle(note) => Line::from(vec![
            Span::styled("· ", Style::default().fg(inactive())),
            Span::styled(note.as_str(), Style::default().fg(text_dim())),
        ]),
    }
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints: Vec<(&str, &str)> = match app.section {
        Section::Slider => vec![
            ("←/→", "Move"),
            ("Home/End", "Jump"),
            ("c", "Connect"),
            ("o", "Fragment"),
            ("Tab", "Next"),
            ("?", "Help"),
        ],
        Section::Messages => vec![
            ("↑↓", "Scroll"),
            ("c", "Connect"),
            ("o", "Fragment"),
            ("Tab", "Next"),
            ("?", "Help"),
        ],
    };

    // Responsive: show fewer hints on narrow terminals
    let max_hints = if area.width < 60 {
        4
    } else {
        hints.len()
    };

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

    let footer = Paragraph::new(Line::from(hint_spans)).alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 90 } else { 60 },
        if area.height < 30 { 90 } else { 70 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(Span::styled(
            "═══ Sections ═══",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  Tab       ", Style::default().fg(accent())),
            Span::raw("Switch between Slider and Messages"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "═══ Slider ═══",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  ←/→ h/l   ", Style::default().fg(accent())),
            Span::raw("Move one step (each move sends sliderMoved)"),
        ]),
        Line::from(vec![
            Span::styled("  Home/End  ", Style::default().fg(accent())),
            Span::raw("Jump to min/max"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "═══ Session ═══",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  c         ", Style::default().fg(accent())),
            Span::raw("Connect (when no connection is live)"),
        ]),
        Line::from(vec![
            Span::styled("  o         ", Style::default().fg(accent())),
            Span::raw("Load the page fragment into a viewer"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "═══ Messages ═══",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  ↑↓ j/k    ", Style::default().fg(accent())),
            Span::raw("Scroll the message log"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "═══ Quick Start ═══",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  fader              ", Style::default().fg(accent())),
            Span::raw("Launch this TUI"),
        ]),
        Line::from(vec![
            Span::styled("  fader --send 42    ", Style::default().fg(accent())),
            Span::raw("Send one value and exit"),
        ]),
        Line::from(vec![
            Span::styled("  fader --listen     ", Style::default().fg(accent())),
            Span::raw("Print incoming messages as JSON lines"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(text_dim())),
            Span::styled("?", Style::default().fg(accent())),
            Span::styled("/", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" to close", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" fader Help ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

fn draw_fragment_popup(f: &mut Frame, app: &App) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 90 } else { 70 },
        if area.height < 30 { 85 } else { 70 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let title = format!(" {} ", fragment::display_name(&app.config.fragment_url));
    let block = Block::default()
        .title(Span::styled(title, Style::default().fg(accent())))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));

    let inner_height = popup_area.height.saturating_sub(2) as usize;
    let lines: Vec<&str> = app.fragment_content.lines().collect();
    let start = app.fragment_scroll.min(lines.len().saturating_sub(1));
    let end = (start + inner_height).min(lines.len());

    let visible: Vec<Line> = lines[start..end]
        .iter()
        .map(|line| Line::styled(*line, Style::default().fg(text())))
        .collect();

    let content = Paragraph::new(visible)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(content, popup_area);
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
