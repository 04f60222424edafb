//! Integration tests for the WebSocket transport.
//!
//! These tests run a real session against a real WebSocket server on
//! localhost that behaves like the backend consumer for a single message.

#![cfg(feature = "transport")]

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parley_client::{
    ChatSession, Identity, MessageId, SessionAction, SessionConfig, SessionEvent, TransportState,
    transport::{SocketEvent, open_socket},
};
use serde_json::{Value, json};
use tokio::{net::TcpListener, sync::mpsc, time::timeout};
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// Accept one socket, echo the first chat message as a broadcast, then close.
async fn start_echo_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        while let Some(Ok(frame)) = ws.next().await {
            let WsMessage::Text(text) = frame else { continue };
            let command: Value = serde_json::from_str(&text).unwrap();
            if command["type"] != "message" {
                continue;
            }

            let broadcast = json!({
                "message": command["message"],
                "username": "me",
                "timestamp": "2024-01-01 10:00:00+00:00",
                "id": 11,
                "read": false,
            });
            ws.send(WsMessage::Text(broadcast.to_string())).await.unwrap();
            ws.close(None).await.unwrap();
            break;
        }
    });

    format!("ws://{addr}/ws/chat")
}

async fn next_event(events: &mut mpsc::Receiver<SocketEvent>) -> SocketEvent {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("socket event within timeout")
        .expect("socket task alive")
}

#[tokio::test]
async fn session_round_trip_over_real_socket() {
    let ws_base = start_echo_server().await;
    let config = SessionConfig { ws_base, ..SessionConfig::default() };
    let mut session: ChatSession = ChatSession::new(Identity::new(3, "me"), config);

    let actions = session.handle(SessionEvent::Mount { peer_id: 7, auth_token: None }).unwrap();
    let Some(SessionAction::Open(request)) = actions.first() else {
        panic!("expected open, got {actions:?}");
    };

    let (tx, mut events) = mpsc::channel(16);
    let socket = open_socket(request, tx).unwrap();

    assert_eq!(next_event(&mut events).await, SocketEvent::Opened);
    let actions = session.handle(SessionEvent::Opened).unwrap();
    assert!(matches!(actions[0], SessionAction::FetchHistory { .. }));

    let room_id = session.room().cloned().unwrap();
    session.handle(SessionEvent::HistoryLoaded { room_id, records: vec![] }).unwrap();

    let actions = session.handle(SessionEvent::SendMessage { text: "hello".into() }).unwrap();
    let Some(SessionAction::SendFrame(text)) = actions.first() else {
        panic!("expected frame, got {actions:?}");
    };
    socket.to_server.send(text.clone()).await.unwrap();
    assert!(session.messages()[0].is_pending());

    let SocketEvent::Text(echo) = next_event(&mut events).await else {
        panic!("expected echo");
    };
    session.handle(SessionEvent::FrameReceived(echo)).unwrap();

    assert_eq!(session.messages().len(), 1);
    assert_eq!(session.messages()[0].id, MessageId::Server(11));

    let SocketEvent::Closed { reason } = next_event(&mut events).await else {
        panic!("expected close");
    };
    session.handle(SessionEvent::Closed { reason }).unwrap();
    assert_eq!(session.connection_state(), TransportState::Closed);
}

#[tokio::test]
async fn unreachable_server_reports_failure() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = SessionConfig { ws_base: format!("ws://{addr}/ws/chat"), ..SessionConfig::default() };
    let mut session: ChatSession = ChatSession::new(Identity::new(3, "me"), config);
    let actions = session.handle(SessionEvent::Mount { peer_id: 7, auth_token: None }).unwrap();
    let Some(SessionAction::Open(request)) = actions.first() else {
        panic!("expected open");
    };

    let (tx, mut events) = mpsc::channel(4);
    let _socket = open_socket(request, tx).unwrap();

    let SocketEvent::Failed(message) = next_event(&mut events).await else {
        panic!("expected failure");
    };
    session.handle(SessionEvent::Failed { message }).unwrap();
    assert_eq!(session.connection_state(), TransportState::Closed);
}

#[tokio::test]
async fn dropping_handle_ends_the_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (ended_tx, ended_rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        // Runs until the client side goes away
        while let Some(Ok(_)) = ws.next().await {}
        let _ = ended_tx.send(());
    });

    let config = SessionConfig { ws_base: format!("ws://{addr}/ws/chat"), ..SessionConfig::default() };
    let mut session: ChatSession = ChatSession::new(Identity::new(3, "me"), config);
    let actions = session.handle(SessionEvent::Mount { peer_id: 7, auth_token: None }).unwrap();
    let Some(SessionAction::Open(request)) = actions.first() else {
        panic!("expected open");
    };

    let (tx, mut events) = mpsc::channel(4);
    let socket = open_socket(request, tx).unwrap();
    assert_eq!(next_event(&mut events).await, SocketEvent::Opened);

    drop(socket);

    timeout(Duration::from_secs(5), ended_rx)
        .await
        .expect("server sees the connection end")
        .unwrap();
}
