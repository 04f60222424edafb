//! Scenario tests for the chat session controller.
//!
//! Each test walks a session through a full mount, open, history, live
//! sequence using only events and actions, the way a driver would.

use std::time::Duration;

use parley_client::{
    ChatSession, HistoryRecord, Identity, RoomId, SessionAction, SessionConfig, SessionEvent,
    TransportState,
};
use proptest::prelude::*;

type Session = ChatSession<Duration>;

fn sent_frames(actions: &[SessionAction]) -> Vec<String> {
    actions
        .iter()
        .filter_map(|a| match a {
            SessionAction::SendFrame(text) => Some(text.clone()),
            _ => None,
        })
        .collect()
}

fn open_session() -> Session {
    let mut session = ChatSession::new(Identity::new(3, "me"), SessionConfig::default());
    session.handle(SessionEvent::Mount { peer_id: 7, auth_token: Some("tok".into()) }).unwrap();
    session.handle(SessionEvent::Opened).unwrap();
    session
}

#[test]
fn history_then_live_message() {
    let mut session: Session = ChatSession::new(Identity::new(3, "me"), SessionConfig::default());

    session.handle(SessionEvent::Mount { peer_id: 7, auth_token: None }).unwrap();
    assert_eq!(session.room().map(RoomId::as_str), Some("3_7"));

    let actions = session.handle(SessionEvent::Opened).unwrap();
    let Some(SessionAction::FetchHistory { room_id, .. }) = actions.first().cloned() else {
        panic!("expected history fetch, got {actions:?}");
    };

    let records = vec![HistoryRecord {
        id: 1,
        message: "hi".into(),
        username: Some("peer7".into()),
        sender: None,
        timestamp: Some("2024-01-01T00:00:00Z".into()),
        read: false,
    }];
    session.handle(SessionEvent::HistoryLoaded { room_id, records }).unwrap();
    assert_eq!(session.messages().len(), 1);
    assert_eq!(session.messages()[0].content, "hi");

    session
        .handle(SessionEvent::FrameReceived(r#"{"id":2,"message":"yo","username":"peer7"}"#.into()))
        .unwrap();

    let contents: Vec<&str> = session.messages().iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["hi", "yo"]);
    assert!(session.messages().iter().all(|m| !m.is_from("me")));
}

#[test]
fn live_message_racing_history_lands_after_it() {
    let mut session = open_session();

    session
        .handle(SessionEvent::FrameReceived(r#"{"id":5,"message":"fast","username":"peer7"}"#.into()))
        .unwrap();
    assert!(session.messages().is_empty());

    let records = vec![HistoryRecord {
        id: 4,
        message: "stored".into(),
        username: Some("peer7".into()),
        sender: None,
        timestamp: None,
        read: true,
    }];
    session.handle(SessionEvent::HistoryLoaded { room_id: RoomId::between(3, 7), records }).unwrap();

    let contents: Vec<&str> = session.messages().iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["stored", "fast"]);
}

#[test]
fn failed_history_still_shows_live_messages() {
    let mut session = open_session();
    session
        .handle(SessionEvent::FrameReceived(r#"{"id":5,"message":"live","username":"peer7"}"#.into()))
        .unwrap();

    session
        .handle(SessionEvent::HistoryFailed {
            room_id: RoomId::between(3, 7),
            reason: "503".into(),
        })
        .unwrap();

    assert_eq!(session.messages().len(), 1);
}

#[test]
fn malformed_frames_leave_session_open() {
    let mut session = open_session();
    for text in ["", "{", "[]", r#"{"type":1}"#, r#"{"type":"presence"}"#] {
        let actions = session.handle(SessionEvent::FrameReceived(text.into())).unwrap();
        assert!(actions.is_empty());
    }
    assert_eq!(session.connection_state(), TransportState::Open);
}

#[test]
fn typing_then_stop_from_peer() {
    let mut session = open_session();
    session
        .handle(SessionEvent::FrameReceived(r#"{"type":"typing","username":"peer7"}"#.into()))
        .unwrap();
    assert_eq!(session.typing_users(), ["peer7"]);

    session
        .handle(SessionEvent::FrameReceived(r#"{"type":"stop_typing","username":"peer7"}"#.into()))
        .unwrap();
    assert!(session.typing_users().is_empty());
}

#[test]
fn prop_keystroke_burst_through_session() {
    proptest!(|(gaps in prop::collection::vec(0u64..3000, 1..30))| {
        let mut session = open_session();
        let mut frames = Vec::new();
        let mut now = Duration::ZERO;

        frames.extend(sent_frames(&session.handle(SessionEvent::Keystroke { now }).unwrap()));
        for gap in gaps {
            now += Duration::from_millis(gap);
            frames.extend(sent_frames(&session.handle(SessionEvent::Tick { now }).unwrap()));
            frames.extend(sent_frames(&session.handle(SessionEvent::Keystroke { now }).unwrap()));
        }

        let deadline = now + Duration::from_millis(3000);
        frames.extend(sent_frames(&session.handle(SessionEvent::Tick { now: deadline }).unwrap()));
        frames.extend(sent_frames(
            &session.handle(SessionEvent::Tick { now: deadline + Duration::from_secs(5) }).unwrap(),
        ));

        prop_assert_eq!(
            frames,
            vec![r#"{"type":"typing"}"#.to_string(), r#"{"type":"stop_typing"}"#.to_string()]
        );
    });
}

#[test]
fn prop_keystrokes_without_ticks_split_on_idle_gaps() {
    proptest!(|(gaps in prop::collection::vec(0u64..6000, 0..30))| {
        let mut session = open_session();
        let mut now = Duration::ZERO;

        let mut frames = sent_frames(&session.handle(SessionEvent::Keystroke { now }).unwrap());
        let mut expected = vec![r#"{"type":"typing"}"#.to_string()];

        for gap in gaps {
            now += Duration::from_millis(gap);
            frames.extend(sent_frames(&session.handle(SessionEvent::Keystroke { now }).unwrap()));
            if gap >= 3000 {
                expected.push(r#"{"type":"stop_typing"}"#.to_string());
                expected.push(r#"{"type":"typing"}"#.to_string());
            }
        }

        prop_assert_eq!(frames, expected);
    });
}
