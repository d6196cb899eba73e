//! UI rendering for the overlay.

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use scorecast_core::{round_slots, Outcome};

use crate::app::App;

// ========== Overlay Colors ==========

const WIN_COLOR: Color = Color::Rgb(34, 197, 94);
const LOSS_COLOR: Color = Color::Rgb(239, 68, 68);
const DRAW_COLOR: Color = Color::Rgb(156, 163, 175);
/// Round not played yet
const NONE_COLOR: Color = Color::Rgb(55, 65, 81);
const TEXT_COLOR: Color = Color::Rgb(250, 250, 250);
const DIM_COLOR: Color = Color::Rgb(128, 128, 128);
const BORDER_COLOR: Color = Color::Rgb(90, 90, 90);

/// Render the overlay.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(6), // Score
        Constraint::Length(5), // Round strip
        Constraint::Min(0),
        Constraint::Length(1), // Footer
    ])
    .split(frame.area());

    render_score_panel(frame, app, chunks[0]);
    render_rounds_panel(frame, app, chunks[1]);
    render_footer(frame, app, chunks[3]);
}

fn panel(title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(Style::default().fg(DIM_COLOR).bold())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
}

/// Score, caption and per-outcome counts.
fn render_score_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel(format!(" {} ", app.player()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let summary = app.summary();
    let mut lines = vec![
        Line::from(Span::styled(
            summary.score_line(),
            Style::default().fg(TEXT_COLOR).bold(),
        )),
        Line::from(Span::styled(
            app.session().label().to_uppercase(),
            Style::default().fg(DIM_COLOR),
        )),
        Line::from(vec![
            Span::styled(format!("{}W ", summary.wins), Style::default().fg(WIN_COLOR)),
            Span::styled(format!("{}D ", summary.draws), Style::default().fg(DRAW_COLOR)),
            Span::styled(format!("{}L", summary.losses), Style::default().fg(LOSS_COLOR)),
        ]),
    ];

    if let Some(accuracy) = summary.average_accuracy {
        lines.push(Line::from(Span::styled(
            format!("avg accuracy {:.1}%", accuracy),
            Style::default().fg(DIM_COLOR),
        )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// One cell per round: number above, colored block below.
fn render_rounds_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel(" Round Results ".to_string());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let slots = round_slots(&app.snapshot.rounds, app.max_rounds);
    if slots.is_empty() {
        return;
    }

    let count = slots.len() as u32;
    let cells =
        Layout::horizontal(vec![Constraint::Ratio(1, count); slots.len()]).split(inner);

    for (i, (slot, cell)) in slots.iter().zip(cells.iter()).enumerate() {
        let lines = vec![
            Line::from(Span::styled(
                format!("{}", i + 1),
                Style::default().fg(DIM_COLOR),
            )),
            Line::from(Span::styled("██", Style::default().fg(outcome_color(*slot)))),
        ];
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), *cell);
    }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let status = match app.snapshot.updated_at {
        Some(ts) => format!("updated {}", format_relative_time(ts)),
        None => "waiting for games".to_string(),
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} · every {}s ", status, app.poll_interval_secs()),
            Style::default().fg(DIM_COLOR),
        ),
        Span::styled("q", Style::default().fg(TEXT_COLOR).bold()),
        Span::styled(" quit  ", Style::default().fg(DIM_COLOR)),
        Span::styled("n", Style::default().fg(TEXT_COLOR).bold()),
        Span::styled(" new session  ", Style::default().fg(DIM_COLOR)),
        Span::styled("r", Style::default().fg(TEXT_COLOR).bold()),
        Span::styled(" refresh", Style::default().fg(DIM_COLOR)),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn outcome_color(slot: Option<Outcome>) -> Color {
    match slot {
        Some(Outcome::Win) => WIN_COLOR,
        Some(Outcome::Loss) => LOSS_COLOR,
        Some(Outcome::Draw) => DRAW_COLOR,
        None => NONE_COLOR,
    }
}

fn outcome_symbol(slot: Option<Outcome>) -> &'static str {
    match slot {
        Some(Outcome::Win) => "W",
        Some(Outcome::Loss) => "L",
        Some(Outcome::Draw) => "D",
        None => "-",
    }
}

/// Plain-text round strip, e.g. `W D L - -`
pub fn format_round_strip(slots: &[Option<Outcome>]) -> String {
    slots
        .iter()
        .map(|slot| outcome_symbol(*slot))
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_relative_time(ts: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(ts);

    if duration.num_seconds() < 5 {
        "just now".to_string()
    } else if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds())
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else {
        format!("{}h ago", duration.num_hours())
    }
}
