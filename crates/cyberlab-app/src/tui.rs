//! Full-screen terminal UI for one challenge.
//!
//! Enter runs the input line, Up/Down recall, Tab completes artifact names,
//! Ctrl+L clears the scrollback. `:submit [flag-id] <flag>` submits a flag.
//! Esc or Ctrl+C quits.

use std::time::Duration;

use anyhow::Result;
use ratatui::DefaultTerminal;
use ratatui::Frame;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::{Constraint, Direction, Layout, Position};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use crate::host::ChallengeHost;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// What a key press asks the loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Run the UI until the user quits. Restores the terminal on every exit path.
pub fn run(host: &mut ChallengeHost) -> Result<()> {
    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, host);
    ratatui::restore();
    result
}

fn event_loop(terminal: &mut DefaultTerminal, host: &mut ChallengeHost) -> Result<()> {
    loop {
        terminal.draw(|f| draw(f, host))?;

        if event::poll(POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind == KeyEventKind::Release {
                continue;
            }
            if handle_key(host, key) == Flow::Quit {
                log::info!("Leaving challenge {}", host.challenge().id);
                return Ok(());
            }
        }
    }
}

fn handle_key(host: &mut ChallengeHost, key: KeyEvent) -> Flow {
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Esc, _) => return Flow::Quit,
        (KeyCode::Char('l'), KeyModifiers::CONTROL) => host.session_mut().clear(),
        (KeyCode::Enter, _) => host.enter(),
        (KeyCode::Up, _) => host.session_mut().recall_previous(),
        (KeyCode::Down, _) => host.session_mut().recall_next(),
        (KeyCode::Tab, _) => {
            host.session_mut().complete();
        },
        (KeyCode::Backspace, _) => host.session_mut().backspace(),
        (KeyCode::Char(ch), m) if !m.contains(KeyModifiers::CONTROL) => {
            host.session_mut().push_char(ch);
        },
        _ => {},
    }
    Flow::Continue
}

fn draw(frame: &mut Frame, host: &ChallengeHost) {
    let challenge = host.challenge();
    let result_rows = u16::try_from(host.results().len()).unwrap_or(u16::MAX);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(if result_rows > 0 { result_rows.saturating_add(2) } else { 0 }),
            Constraint::Length(3),
        ])
        .split(frame.area());

    // Header
    let mut header = vec![
        Span::styled(
            challenge.title.as_str(),
            Style::new().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "  {} | {:?} | {} pts",
            challenge.category, challenge.difficulty, challenge.points
        )),
    ];
    if let Some(badge) = host.badge() {
        header.push(Span::styled(
            format!("  [{badge}]"),
            Style::new().fg(Color::Yellow),
        ));
    }
    frame.render_widget(
        Paragraph::new(Line::from(header)).block(Block::bordered().title("Challenge")),
        chunks[0],
    );

    // Scrollback, pinned to the bottom
    let session = host.session();
    let lines: Vec<Line> = session
        .scrollback()
        .iter()
        .flat_map(|entry| {
            session
                .render_entry(entry)
                .split('\n')
                .map(|l| Line::from(l.to_string()))
                .collect::<Vec<_>>()
        })
        .collect();
    let visible = chunks[1].height.saturating_sub(2);
    let total = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let scroll = total.saturating_sub(visible);
    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::new().fg(Color::Green))
            .scroll((scroll, 0))
            .block(Block::bordered().title("Terminal")),
        chunks[1],
    );

    // Status
    frame.render_widget(
        Paragraph::new(host.status()).block(Block::bordered().title("Status")),
        chunks[2],
    );

    // Sub-flag results
    if result_rows > 0 {
        let rows: Vec<Line> = host
            .results()
            .iter()
            .map(|(id, r)| {
                let color = if r.success { Color::Green } else { Color::Red };
                Line::from(vec![
                    Span::raw(format!("{id}: ")),
                    Span::styled(r.message.as_str(), Style::new().fg(color)),
                ])
            })
            .collect();
        frame.render_widget(
            Paragraph::new(rows).block(Block::bordered().title("Flags")),
            chunks[3],
        );
    }

    // Input
    let prompt = "$ ";
    frame.render_widget(
        Paragraph::new(format!("{prompt}{}", session.input()))
            .block(Block::bordered().title("Enter command... (try: help)")),
        chunks[4],
    );
    let typed = u16::try_from(prompt.len() + session.input().chars().count()).unwrap_or(u16::MAX);
    let cursor_x = chunks[4].x.saturating_add(1).saturating_add(typed);
    frame.set_cursor_position(Position::new(
        cursor_x.min(chunks[4].right().saturating_sub(2)),
        chunks[4].y + 1,
    ));
}
