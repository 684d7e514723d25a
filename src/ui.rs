use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use takt::scorer::Classification;
use takt::session::{Completion, Phase, Session};

use crate::{App, Screen};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.screen {
            Screen::Typing => render_typing(self, area, buf),
            Screen::Results => render_results(self, area, buf),
        }
    }
}

fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let session = app.controller.session();

    match session.phase() {
        Phase::Idle => {
            let message = if app.controller.start_pending() {
                "fetching a quote..."
            } else {
                "press 's' to start a trial"
            };
            let banner = Paragraph::new(Span::styled(
                message,
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::BOLD | Modifier::ITALIC),
            ))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
            banner.render(area, buf);
        }
        Phase::Paused => {
            let banner = Paragraph::new(Span::styled(
                "PAUSED - press tab to resume",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD | Modifier::ITALIC),
            ))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
            banner.render(area, buf);
        }
        Phase::Running | Phase::Finished => {
            let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
            let mut prompt_occupied_lines =
                ((session.target().width() as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16;

            if session.target().width() <= max_chars_per_line as usize {
                prompt_occupied_lines = 1;
            }

            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .horizontal_margin(HORIZONTAL_MARGIN)
                .vertical_margin(VERTICAL_MARGIN)
                .constraints([
                    Constraint::Length(2),
                    Constraint::Length(prompt_occupied_lines),
                    Constraint::Length(2),
                    Constraint::Min(0),
                    Constraint::Length(1),
                ])
                .split(area);

            render_countdown(app, chunks[0], buf);

            let widget = Paragraph::new(Line::from(target_spans(session)))
                .alignment(if prompt_occupied_lines == 1 {
                    Alignment::Center
                } else {
                    Alignment::Left
                })
                .wrap(Wrap { trim: true });
            widget.render(chunks[1], buf);

            render_feedback(app, chunks[2], buf);

            let help = Paragraph::new(Span::styled(
                "(tab) pause  (enter) finish  (esc) quit",
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center);
            help.render(chunks[4], buf);
        }
    }
}

fn render_countdown(app: &App, area: Rect, buf: &mut Buffer) {
    let session = app.controller.session();

    let style = if app.low_time {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::DIM)
    };

    let timer = Paragraph::new(Span::styled(
        format!("{}s", session.seconds_remaining()),
        style,
    ))
    .alignment(Alignment::Center);
    timer.render(area, buf);
}

/// Overlay the typed buffer on the target: green for a hit, yellow for a
/// case slip, red for a miss; the next expected character is underlined and
/// the untouched tail dimmed. Characters typed past the end show up red.
fn target_spans(session: &Session) -> Vec<Span<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let green = bold.fg(Color::Green);
    let yellow = bold.fg(Color::Yellow);
    let red = bold.fg(Color::Red);
    let dim = bold.add_modifier(Modifier::DIM);
    let cursor = dim.add_modifier(Modifier::UNDERLINED);

    let typed: Vec<char> = session.typed().chars().collect();
    let target: Vec<char> = session.target().chars().collect();

    let mut spans = Vec::with_capacity(target.len() + 1);

    for (idx, &expected) in target.iter().enumerate() {
        let span = match typed.get(idx) {
            Some(&t) if t == expected => Span::styled(expected.to_string(), green),
            Some(&t) if t.to_lowercase().eq(expected.to_lowercase()) => {
                Span::styled(t.to_string(), yellow)
            }
            Some(&t) => Span::styled(
                match t {
                    ' ' => "\u{b7}".to_owned(),
                    c => c.to_string(),
                },
                red,
            ),
            None if idx == typed.len() => Span::styled(expected.to_string(), cursor),
            None => Span::styled(expected.to_string(), dim),
        };
        spans.push(span);
    }

    for &t in typed.iter().skip(target.len()) {
        spans.push(Span::styled(
            match t {
                ' ' => "\u{b7}".to_owned(),
                c => c.to_string(),
            },
            red,
        ));
    }

    spans
}

fn render_feedback(app: &App, area: Rect, buf: &mut Buffer) {
    let (text, color) = match app.feedback {
        None => ("", Color::Gray),
        Some(Classification::Clean) => ("typing...", Color::Green),
        Some(Classification::CaseMismatch) => ("case slip", Color::Yellow),
        Some(Classification::CharMismatch) => ("wrong character", Color::Red),
    };

    let feedback = Paragraph::new(Span::styled(
        text,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    feedback.render(area, buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let session = app.controller.session();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(4),
            Constraint::Length(1),
        ])
        .split(area);

    let wpm = session.final_wpm().unwrap_or(0.0);
    let banner = Paragraph::new(Span::styled(
        format!("Test Finished! Speed: {wpm:.2} WPM"),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    banner.render(chunks[0], buf);

    let how = match session.completion() {
        Some(Completion::ExactMatch) => "completed the whole sentence",
        Some(Completion::Timeout) => "time ran out",
        Some(Completion::Manual) => "stopped early",
        None => "",
    };
    let completion = Paragraph::new(Span::styled(
        how,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center);
    completion.render(chunks[1], buf);

    if let Some(elapsed) = session.final_elapsed_secs() {
        let elapsed_line = Paragraph::new(Span::styled(
            format!("{elapsed:.1}s active"),
            Style::default().add_modifier(Modifier::DIM),
        ))
        .alignment(Alignment::Center);
        elapsed_line.render(chunks[2], buf);
    }

    render_leaderboard(app, chunks[3], buf);

    let help = Paragraph::new(Span::styled(
        "(s) new trial  (esc) quit",
        Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center);
    help.render(chunks[4], buf);
}

fn render_leaderboard(app: &App, area: Rect, buf: &mut Buffer) {
    let entries = app.controller.leaderboard().entries();

    let header = Row::new(vec![
        Cell::from("#"),
        Cell::from("wpm"),
        Cell::from("when"),
    ])
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = entries
        .iter()
        .enumerate()
        .map(|(rank, entry)| {
            Row::new(vec![
                Cell::from(format!("{}", rank + 1)),
                Cell::from(format!("{:.2}", entry.wpm)),
                Cell::from(entry.at.format("%H:%M:%S").to_string()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        &[
            Constraint::Length(4),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title("Top Speeds"));

    table.render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ModeArg, RuntimeSettings};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::time::{Duration, SystemTime};
    use takt::clock::ManualClock;
    use takt::controller::SessionController;

    fn test_app(quote: &str) -> App {
        let (tx, _rx) = mpsc::channel();
        let clock = ManualClock::new(SystemTime::UNIX_EPOCH + Duration::from_secs(1));
        let controller = SessionController::new(tx, Arc::new(clock));
        App::new(
            controller,
            &RuntimeSettings {
                mode: ModeArg::Sixty,
                offline: true,
                quote: Some(quote.to_string()),
            },
        )
    }

    fn draw(app: &mut App) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| f.render_widget(&*app, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn idle_screen_shows_the_start_hint() {
        let mut app = test_app("hello");
        let content = draw(&mut app);
        assert!(content.contains("press 's'"));
    }

    #[test]
    fn typing_screen_shows_target_and_countdown() {
        let mut app = test_app("hello world");
        app.start_trial();

        let content = draw(&mut app);
        assert!(content.contains("hello world"));
        assert!(content.contains("60s"));
    }

    #[test]
    fn paused_screen_shows_the_banner() {
        let mut app = test_app("hello");
        app.start_trial();
        app.controller.pause();

        let content = draw(&mut app);
        assert!(content.contains("PAUSED"));
    }

    #[test]
    fn results_screen_shows_speed_and_board() {
        let mut app = test_app("hi");
        app.start_trial();
        let notices = app.controller.submit("hi");
        app.apply(notices);

        let content = draw(&mut app);
        assert!(content.contains("Test Finished!"));
        assert!(content.contains("Top Speeds"));
    }

    #[test]
    fn mistyped_space_renders_a_visible_marker() {
        let mut app = test_app("ab");
        app.start_trial();
        let notices = app.controller.submit(" ");
        app.apply(notices);

        let content = draw(&mut app);
        assert!(content.contains('\u{b7}'));
    }

    #[test]
    fn target_spans_cover_overlay_cursor_and_tail() {
        let mut app = test_app("abcd");
        app.start_trial();
        let notices = app.controller.submit("aB");
        app.apply(notices);

        let spans = target_spans(app.controller.session());
        // one span per target char, no excess typed characters
        assert_eq!(spans.len(), 4);
        assert_eq!(spans[0].content, "a");
        // case slip shows what was actually typed
        assert_eq!(spans[1].content, "B");
    }

    #[test]
    fn excess_typed_characters_are_rendered() {
        let mut app = test_app("ab");
        app.start_trial();
        let notices = app.controller.submit("abX");
        app.apply(notices);

        // target satisfied plus one excess char
        let spans = target_spans(app.controller.session());
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[2].content, "X");
    }
}
