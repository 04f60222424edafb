//! UI rendering
//!
//! Rendering functions that turn a [`ChatView`] into terminal output using
//! ratatui widgets. All functions are pure (no I/O).

mod chat;
mod input;
mod status;

use std::{ops::Sub, time::Duration};

use parley_app::ChatView;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Paragraph,
};

/// Render the entire UI.
pub fn render<I>(frame: &mut Frame, view: &ChatView<'_, I>)
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    const CHAT_AREA_MIN_HEIGHT: u16 = 3;
    const TYPING_HEIGHT: u16 = 1;
    const INPUT_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(CHAT_AREA_MIN_HEIGHT),
            Constraint::Length(TYPING_HEIGHT),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [chat_area, typing_area, input_area, status_area] = chunks.as_ref() else {
        return;
    };

    chat::render(frame, view, *chat_area);

    if let Some(line) = view.typing_line() {
        let style = Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC);
        frame.render_widget(Paragraph::new(Span::styled(line, style)), *typing_area);
    }

    input::render(frame, view.composer(), *input_area);
    status::render(frame, view, *status_area);
}

#[cfg(test)]
mod tests {
    use parley_app::App;
    use parley_client::{ChatSession, Identity, RoomId, SessionConfig, SessionEvent};
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;

    fn live_session() -> ChatSession<Duration> {
        let mut session = ChatSession::new(Identity::new(1, "ana"), SessionConfig::default());
        session.handle(SessionEvent::Mount { peer_id: 2, auth_token: None }).unwrap();
        session.handle(SessionEvent::Opened).unwrap();
        session
            .handle(SessionEvent::HistoryLoaded { room_id: RoomId::between(1, 2), records: vec![] })
            .unwrap();
        session
    }

    fn draw(app: &App, session: &ChatSession<Duration>, width: u16, height: u16) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(frame, &ChatView::new(app, session))).unwrap();

        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(usize::from(buffer.area.width))
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>().trim_end().to_string())
            .collect()
    }

    #[test]
    fn full_frame() {
        let app = App::new();
        let mut session = live_session();
        session
            .handle(SessionEvent::FrameReceived(r#"{"id":1,"message":"hi","username":"bo"}"#.into()))
            .unwrap();
        session
            .handle(SessionEvent::FrameReceived(r#"{"type":"typing","username":"bo"}"#.into()))
            .unwrap();

        let lines = draw(&app, &session, 30, 9);

        insta::assert_snapshot!(lines.join("\n"), @r"
        ┌ 1_2 ───────────────────────┐
        │bo: hi                      │
        │                            │
        └────────────────────────────┘
        bo is typing...
        ┌────────────────────────────┐
        │>                           │
        └────────────────────────────┘
        Connected | ana | 1_2
        ");
    }

    #[test]
    fn typing_row_blank_when_nobody_types() {
        let app = App::new();
        let session = live_session();

        let lines = draw(&app, &session, 30, 9);
        assert_eq!(lines[4], "");
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        let app = App::new();
        let session = live_session();
        let lines = draw(&app, &session, 4, 2);
        assert_eq!(lines.len(), 2);
    }
}
