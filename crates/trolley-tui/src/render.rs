//! Rendering for the quiz TUI.

use std::sync::{Arc, Mutex};

use ratatui::prelude::*;
use ratatui::widgets::*;
use trolley::QuizState;
use trolley::item::{Agreement, Choice};
use trolley::session::View;
use trolley::ui::{LogLevel, LogLine};

use crate::app::App;

// ── Public Utilities ──────────────────────────────────────────────────

/// Map a log level to a ratatui [`Style`].
pub fn log_level_style(level: LogLevel) -> Style {
    match level {
        LogLevel::Trace => Style::default().fg(Color::DarkGray),
        LogLevel::Debug => Style::default().fg(Color::Cyan),
        LogLevel::Info => Style::default().fg(Color::Green),
        LogLevel::Warn => Style::default().fg(Color::Yellow),
        LogLevel::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

/// A `width`-cell bar filled in proportion to `pct`, e.g. `████░░░░ 50%`.
pub fn agreement_bar(pct: u32, width: usize) -> String {
    let pct = pct.min(100);
    let filled = (pct as usize * width) / 100;
    let empty = width.saturating_sub(filled);
    format!("{}{} {pct}%", "\u{2588}".repeat(filled), "\u{2591}".repeat(empty))
}

// ── Root Render ───────────────────────────────────────────────────────

/// What the middle pane shows, detached from the session borrow.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Screen {
    Loading,
    Error(&'static str),
    Empty,
    Question { visible: String, revealed: bool },
    Estimate {
        question: String,
        choice: Choice,
        agreement: Agreement,
    },
}

/// Snapshot of QuizState fields needed for rendering.
///
/// Cloned in one shot so the lock is held only for the copy, never during
/// widget construction. The driver's reveal task writes to the same state
/// every few milliseconds.
struct RenderSnapshot {
    screen: Screen,
    backend: String,
    answered: u32,
    adjectives: Vec<String>,
    remaining: usize,
    in_flight: bool,
    logs: Vec<LogLine>,
}

impl RenderSnapshot {
    fn take(s: &QuizState, with_logs: bool) -> Self {
        let screen = match s.session.view() {
            View::Loading => Screen::Loading,
            View::Error { message } => Screen::Error(message),
            View::Empty => Screen::Empty,
            View::Question { revealed, .. } => Screen::Question {
                visible: s.visible_question().to_string(),
                revealed,
            },
            View::Estimate {
                item,
                choice,
                agreement,
            } => Screen::Estimate {
                question: item.question.clone(),
                choice,
                agreement,
            },
        };
        Self {
            screen,
            backend: s.backend.clone(),
            answered: s.answered,
            adjectives: s.adjectives.clone(),
            remaining: s.session.remaining(),
            in_flight: s.session.is_in_flight(),
            logs: if with_logs { s.logs.clone() } else { Vec::new() },
        }
    }
}

pub(crate) fn render(frame: &mut Frame, state: &Arc<Mutex<QuizState>>, app: &App) {
    let area = frame.area();

    // Outer layout: [4] status | [flex] middle | [3] key hints.
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(area);

    let snap = match state.lock() {
        Ok(s) => RenderSnapshot::take(&s, app.show_logs),
        Err(_) => return,
    };

    render_status(frame, chunks[0], &snap);
    render_hints(frame, chunks[2], &snap.screen, app);

    if app.show_logs {
        let mid = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);
        render_quiz(frame, mid[0], &snap.screen, app);
        render_logs(frame, mid[1], &snap.logs, app);
    } else {
        render_quiz(frame, chunks[1], &snap.screen, app);
    }
}

// ── Status Pane ───────────────────────────────────────────────────────

fn render_status(frame: &mut Frame, area: Rect, snap: &RenderSnapshot) {
    let queue = if snap.in_flight {
        format!("{} queued, fetching\u{2026}", snap.remaining)
    } else {
        format!("{} queued", snap.remaining)
    };
    let adjectives = if snap.adjectives.is_empty() {
        "\u{2013}".to_string()
    } else {
        snap.adjectives.join(", ")
    };

    let status_text = vec![
        Line::from(vec![
            Span::styled("Model: ", Style::default().fg(Color::DarkGray)),
            Span::raw(snap.backend.clone()),
            Span::raw("   "),
            Span::styled("Answered: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                snap.answered.to_string(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Flavour: ", Style::default().fg(Color::DarkGray)),
            Span::styled(adjectives, Style::default().fg(Color::Magenta)),
            Span::raw("   "),
            Span::styled(queue, Style::default().fg(Color::Cyan)),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue))
        .title(" Absurd Trolley Problems ");

    frame.render_widget(Paragraph::new(status_text).block(block), area);
}

// ── Quiz Pane ─────────────────────────────────────────────────────────

fn render_quiz(frame: &mut Frame, area: Rect, screen: &Screen, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let text_style = Style::default().fg(Color::White);
    let dim = Style::default().fg(Color::DarkGray);

    let lines: Vec<Line> = match screen {
        Screen::Loading => vec![Line::from(Span::styled(
            "Loading trolley problems\u{2026}",
            Style::default().fg(Color::Yellow),
        ))],
        Screen::Error(message) => vec![
            Line::from(Span::styled(
                *message,
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::default(),
            Line::from(Span::styled("Press [r] to try again.", dim)),
        ],
        Screen::Empty => vec![Line::from(Span::styled("No trolley problems.", dim))],
        Screen::Question { visible, revealed } => {
            let mut question = vec![Span::styled(visible.clone(), text_style)];
            if !revealed {
                question.push(Span::styled("\u{258c}", Style::default().fg(Color::Yellow)));
            }
            let mut lines = vec![Line::from(question), Line::default()];
            if *revealed {
                lines.push(choice_row(app.hovered));
            }
            lines
        }
        Screen::Estimate {
            question,
            choice,
            agreement,
        } => {
            let mut lines = vec![
                Line::from(Span::styled(question.clone(), text_style)),
                Line::default(),
                Line::from(vec![
                    Span::styled("You chose: ", dim),
                    Span::styled(
                        choice.label(),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ),
                ]),
                Line::default(),
                Line::from(Span::styled(
                    agreement.to_string(),
                    Style::default().fg(Color::Green),
                )),
            ];
            if let Agreement::Percent { agree, .. } = agreement {
                lines.push(Line::from(Span::styled(
                    agreement_bar(*agree, 30),
                    Style::default().fg(Color::Green),
                )));
            }
            lines
        }
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn choice_row(hovered: Choice) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, choice) in Choice::ALL.into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("    "));
        }
        let style = if choice == hovered {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Yellow)
        };
        spans.push(Span::styled(format!(" [{}] {} ", i + 1, choice.label()), style));
    }
    Line::from(spans)
}

// ── Log Pane ──────────────────────────────────────────────────────────

fn render_logs(frame: &mut Frame, area: Rect, logs: &[LogLine], app: &App) {
    let inner_height = area.height.saturating_sub(2) as usize;

    let mut lines: Vec<Line> = Vec::with_capacity(logs.len());

    for log in logs {
        // Trace and debug are too noisy for the pane.
        if matches!(log.level, LogLevel::Trace | LogLevel::Debug) {
            continue;
        }
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", log.time), Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{} ", log.level.label()),
                log_level_style(log.level),
            ),
            Span::raw(log.message.as_str()),
        ]));
    }

    let total = lines.len();
    let scroll = total
        .saturating_sub(inner_height)
        .saturating_sub(app.log_scroll);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Log ");

    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((scroll as u16, 0))
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

// ── Key Hints ─────────────────────────────────────────────────────────

fn render_hints(frame: &mut Frame, area: Rect, screen: &Screen, app: &App) {
    let (hint, color) = match (app.status_message.as_ref(), screen) {
        (Some(msg), _) => (msg.clone(), Color::White),
        (None, Screen::Question { revealed: true, .. }) => (
            "[1/2] choose  [\u{2190}/\u{2192}] move  [Enter] confirm  [,] logs  [q] quit".into(),
            Color::Yellow,
        ),
        (None, Screen::Estimate { .. }) => (
            "[Enter/n] next problem  [,] logs  [q] quit".into(),
            Color::Green,
        ),
        (None, Screen::Error(_)) => ("[r] retry  [,] logs  [q] quit".into(), Color::Red),
        (None, _) => ("[,] logs  [q] quit".into(), Color::DarkGray),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(format!(" {hint} "));

    frame.render_widget(block, area);
}

// ── Tests ─────────────────────────────────────────────────────────────
