//! Chat area
//!
//! Displays the messages of the open room, newest at the bottom.

use std::{ops::Sub, time::Duration};

use parley_app::ChatView;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

const BORDER_SIZE: u16 = 2;

/// Render the chat area.
pub fn render<I>(frame: &mut Frame, view: &ChatView<'_, I>, area: Rect)
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    let title = view.room().map_or_else(|| " No Chat ".to_string(), |room| format!(" {room} "));
    let block = Block::default().borders(Borders::ALL).title(title);

    let items: Vec<ListItem> = if view.room().is_none() {
        vec![ListItem::new(Line::from(Span::styled(
            "Type /peer <user_id> to start chatting",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        let me = view.username();
        view.messages()
            .iter()
            .map(|msg| {
                let sender_color = if msg.is_from(me) { Color::Cyan } else { Color::Green };
                let mut spans = vec![
                    Span::styled(
                        format!("{}:", msg.sender_username),
                        Style::default().fg(sender_color).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(" "),
                    Span::raw(msg.content.clone()),
                ];
                if msg.is_pending() {
                    spans.push(Span::styled(" (sending)", Style::default().fg(Color::DarkGray)));
                } else if msg.read && msg.is_from(me) {
                    spans.push(Span::styled(" (read)", Style::default().fg(Color::DarkGray)));
                }
                ListItem::new(Line::from(spans))
            })
            .collect()
    };

    let visible_height = usize::from(area.height.saturating_sub(BORDER_SIZE));
    let skip = items.len().saturating_sub(visible_height);
    let visible_items: Vec<_> = items.into_iter().skip(skip).collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}
