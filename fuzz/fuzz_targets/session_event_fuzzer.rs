//! Fuzz target for the chat session state machine
//!
//! Drives a session with arbitrary lifecycle, socket, history and user events
//! in any order.
//!
//! # Invariants
//!
//! - `handle` never panics
//! - No room state survives an unmount
//! - The local user never appears in the typing set
//! - Typing users are unique
//! - Pending messages are only ever from the local user

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use parley_client::{
    ChatSession, HistoryRecord, Identity, RoomId, SessionConfig, SessionEvent,
};

const LOCAL_ID: u64 = 3;
const LOCAL_NAME: &str = "me";

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Mount { peer: u8 },
    Unmount,
    Opened,
    Closed,
    Failed,
    Frame(FrameKind),
    RawFrame(String),
    History { peer: u8, ids: Vec<u8> },
    HistoryFailed { peer: u8 },
    Send(String),
    Keystroke,
    MarkAsRead(u8),
    Tick { advance_ms: u16 },
}

#[derive(Debug, Clone, Arbitrary)]
enum FrameKind {
    Message { id: u8, from_local: bool, text: String },
    Typing { from_local: bool },
    StopTyping { from_local: bool },
    Error,
}

fn sender(from_local: bool) -> &'static str {
    if from_local { LOCAL_NAME } else { "peer" }
}

fn frame_text(kind: &FrameKind) -> String {
    match kind {
        FrameKind::Message { id, from_local, text } => format!(
            r#"{{"id":{id},"message":{},"username":"{}"}}"#,
            escape(text),
            sender(*from_local)
        ),
        FrameKind::Typing { from_local } => {
            format!(r#"{{"type":"typing","username":"{}"}}"#, sender(*from_local))
        },
        FrameKind::StopTyping { from_local } => {
            format!(r#"{{"type":"stop_typing","username":"{}"}}"#, sender(*from_local))
        },
        FrameKind::Error => r#"{"error":"User not authenticated"}"#.to_string(),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::from("\"");
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn room(peer: u8) -> RoomId {
    RoomId::between(LOCAL_ID, u64::from(peer))
}

fuzz_target!(|ops: Vec<Op>| {
    let mut session: ChatSession<Duration> =
        ChatSession::new(Identity::new(LOCAL_ID, LOCAL_NAME), SessionConfig::default());
    let mut now = Duration::ZERO;

    for op in ops {
        let event = match op {
            Op::Mount { peer } => {
                SessionEvent::Mount { peer_id: u64::from(peer), auth_token: Some("t".into()) }
            },
            Op::Unmount => SessionEvent::Unmount,
            Op::Opened => SessionEvent::Opened,
            Op::Closed => SessionEvent::Closed { reason: None },
            Op::Failed => SessionEvent::Failed { message: "reset".into() },
            Op::Frame(kind) => SessionEvent::FrameReceived(frame_text(&kind)),
            Op::RawFrame(text) => SessionEvent::FrameReceived(text),
            Op::History { peer, ids } => SessionEvent::HistoryLoaded {
                room_id: room(peer),
                records: ids
                    .into_iter()
                    .map(|id| HistoryRecord {
                        id: u64::from(id),
                        message: format!("h{id}"),
                        username: Some("peer".into()),
                        sender: None,
                        timestamp: None,
                        read: false,
                    })
                    .collect(),
            },
            Op::HistoryFailed { peer } => {
                SessionEvent::HistoryFailed { room_id: room(peer), reason: "503".into() }
            },
            Op::Send(text) => SessionEvent::SendMessage { text },
            Op::Keystroke => SessionEvent::Keystroke { now },
            Op::MarkAsRead(id) => SessionEvent::MarkAsRead { message_id: u64::from(id) },
            Op::Tick { advance_ms } => {
                now += Duration::from_millis(u64::from(advance_ms));
                SessionEvent::Tick { now }
            },
        };

        // Errors are fine; panics are not
        let _ = session.handle(event);

        let typing = session.typing_users();
        assert!(!typing.iter().any(|u| u == LOCAL_NAME), "local user in typing set");
        for (i, user) in typing.iter().enumerate() {
            assert!(!typing[i + 1..].contains(user), "duplicate typing user {user}");
        }

        assert!(
            session.messages().iter().filter(|m| m.is_pending()).all(|m| m.is_from(LOCAL_NAME)),
            "pending message from a peer"
        );

        if session.room().is_none() {
            assert!(session.messages().is_empty(), "messages without a room");
            assert!(typing.is_empty(), "typing users without a room");
        }
    }
});
