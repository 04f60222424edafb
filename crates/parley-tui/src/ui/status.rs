//! Status bar
//!
//! Displays connection state, identity, room and the latest notice.

use std::{ops::Sub, time::Duration};

use parley_app::ChatView;
use parley_client::TransportState;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

/// Render the status bar.
pub fn render<I>(frame: &mut Frame, view: &ChatView<'_, I>, area: Rect)
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    let connection = match view.connection_state() {
        TransportState::Idle => Span::styled("Offline", Style::default().fg(Color::Gray)),
        TransportState::Connecting => {
            Span::styled("Connecting...", Style::default().fg(Color::Yellow))
        },
        TransportState::Open => Span::styled(
            "Connected",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        TransportState::Closed => Span::styled("Disconnected", Style::default().fg(Color::Red)),
    };

    let mut spans = vec![connection, Span::raw(format!(" | {}", view.username()))];
    if let Some(room) = view.room() {
        spans.push(Span::raw(format!(" | {room}")));
    }
    if let Some(status) = view.status() {
        spans.push(Span::styled(format!(" | {status}"), Style::default().fg(Color::Yellow)));
    }

    let paragraph =
        Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(paragraph, area);
}
