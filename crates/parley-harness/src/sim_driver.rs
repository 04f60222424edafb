//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the terminal driver but talks
//! to a [`SimRelay`] instead of a socket and records what it renders. It
//! implements [`Driver`] so the same [`parley_app::Runtime`] orchestration
//! code runs in both production and simulation.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use parley_app::{AppEvent, ChatView, Driver, DriverSignal, KeyInput};
use parley_client::{OpenRequest, TransportState};
use parley_proto::RoomId;

use crate::{
    ConnId, SimInstant, SimRelay,
    invariants::{ClientSnapshot, MessageSnapshot},
};

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// What the last render showed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedView {
    /// Message lines as `username: content`, pending ones suffixed ` (sending)`.
    pub lines: Vec<String>,
    /// Typing indicator text.
    pub typing: Option<String>,
    /// Status line text.
    pub status: Option<String>,
    /// Socket state
    pub connection: Option<TransportState>,
    /// Composer text
    pub composer: String,
}

#[derive(Default)]
struct SharedState {
    pending_events: VecDeque<AppEvent>,
    signals: VecDeque<DriverSignal>,
    sent: Vec<String>,
    conn: Option<ConnId>,
    hold_history: bool,
    held_history: Vec<DriverSignal>,
    last_render: RenderedView,
    snapshot: ClientSnapshot,
    render_count: usize,
    stopped: bool,
}

/// Simulation driver for deterministic testing.
pub struct SimDriver {
    state: Arc<Mutex<SharedState>>,
    relay: SimRelay,
}

impl SimDriver {
    /// Create a driver connected to `relay`.
    pub fn new(relay: SimRelay) -> Self {
        Self { state: Arc::new(Mutex::new(SharedState::default())), relay }
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inject an `AppEvent` for processing.
    pub fn inject_event(&self, event: AppEvent) {
        self.lock().pending_events.push_back(event);
    }

    /// Inject key presses that type `text`.
    pub fn inject_text(&self, text: &str) {
        let mut state = self.lock();
        state.pending_events.extend(text.chars().map(|c| AppEvent::Key(KeyInput::Char(c))));
    }

    /// Inject a line of text followed by Enter.
    pub fn inject_line(&self, text: &str) {
        self.inject_text(text);
        self.inject_event(AppEvent::Key(KeyInput::Enter));
    }

    /// Inject a raw frame as if the server had sent it.
    pub fn inject_frame(&self, text: impl Into<String>) {
        self.lock().signals.push_back(DriverSignal::Text(text.into()));
    }

    /// Hold history results until [`SimDriver::release_history`].
    pub fn hold_history(&self) {
        self.lock().hold_history = true;
    }

    /// Deliver held history results.
    pub fn release_history(&self) {
        let mut state = self.lock();
        state.hold_history = false;
        let held = std::mem::take(&mut state.held_history);
        state.signals.extend(held);
    }

    /// Take all frames sent to the server.
    pub fn take_sent(&self) -> Vec<String> {
        std::mem::take(&mut self.lock().sent)
    }

    /// Move frames from the relay into the signal queue.
    pub fn pump(&self) {
        let mut state = self.lock();
        if let Some(conn) = state.conn {
            let frames = self.relay.take_inbox(conn);
            state.signals.extend(frames.into_iter().map(DriverSignal::Text));
        }
    }

    /// Check if there is input or relay traffic waiting.
    pub fn has_pending(&self) -> bool {
        self.pump();
        let state = self.lock();
        !state.pending_events.is_empty() || !state.signals.is_empty()
    }

    /// What the last render showed.
    pub fn last_render(&self) -> RenderedView {
        self.lock().last_render.clone()
    }

    /// Observable state as of the last render.
    pub fn snapshot(&self) -> ClientSnapshot {
        self.lock().snapshot.clone()
    }

    /// Number of render calls.
    pub fn render_count(&self) -> usize {
        self.lock().render_count
    }

    /// Whether the runtime stopped the driver.
    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Whether a relay connection is open.
    pub fn is_connected(&self) -> bool {
        self.lock().conn.is_some()
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;
    type Instant = SimInstant;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, Self::Error> {
        Ok(self.lock().pending_events.pop_front())
    }

    fn open(&mut self, request: &OpenRequest) {
        let result = self.relay.connect(&request.url);
        let mut state = self.lock();
        match result {
            Ok(conn) => {
                state.conn = Some(conn);
                state.signals.push_back(DriverSignal::Opened);
            },
            Err(e) => state.signals.push_back(DriverSignal::Failed { message: e.to_string() }),
        }
    }

    async fn send_text(&mut self, text: String) -> Result<(), Self::Error> {
        let conn = {
            let mut state = self.lock();
            state.sent.push(text.clone());
            state.conn
        };
        if let Some(conn) = conn {
            self.relay.receive(conn, &text);
        }
        Ok(())
    }

    fn close(&mut self) {
        let mut state = self.lock();
        if let Some(conn) = state.conn.take() {
            self.relay.disconnect(conn);
        }
        state.signals.retain(|s| {
            matches!(s, DriverSignal::HistoryLoaded { .. } | DriverSignal::HistoryFailed { .. })
        });
    }

    fn fetch_history(&mut self, room_id: RoomId, _auth_token: Option<String>) {
        let signal = match self.relay.history(&room_id) {
            Ok(records) => DriverSignal::HistoryLoaded { room_id, records },
            Err(e) => DriverSignal::HistoryFailed { room_id, reason: e.to_string() },
        };

        let mut state = self.lock();
        if state.hold_history {
            state.held_history.push(signal);
        } else {
            state.signals.push_back(signal);
        }
    }

    fn recv_signal(&mut self) -> Option<DriverSignal> {
        if self.lock().signals.is_empty() {
            self.pump();
        }
        self.lock().signals.pop_front()
    }

    fn render(&mut self, view: &ChatView<'_, SimInstant>) -> Result<(), Self::Error> {
        let lines = view
            .messages()
            .iter()
            .map(|m| {
                let suffix = if m.is_pending() { " (sending)" } else { "" };
                format!("{}: {}{suffix}", m.sender_username, m.content)
            })
            .collect();

        let snapshot = ClientSnapshot {
            username: view.username().to_string(),
            user_id: view.user_id(),
            peer_id: view.peer_id(),
            room: view.room().map(str::to_string),
            typing_users: view.typing_users().to_vec(),
            messages: view
                .messages()
                .iter()
                .map(|m| MessageSnapshot {
                    id: m.id,
                    sender: m.sender_username.clone(),
                    content: m.content.clone(),
                })
                .collect(),
        };

        let mut state = self.lock();
        state.last_render = RenderedView {
            lines,
            typing: view.typing_line(),
            status: view.status().map(str::to_string),
            connection: view.room().map(|_| view.connection_state()),
            composer: view.composer().text().to_string(),
        };
        state.snapshot = snapshot;
        state.render_count += 1;
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.lock();
        if let Some(conn) = state.conn.take() {
            self.relay.disconnect(conn);
        }
        state.stopped = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimEnv;

    fn driver() -> (SimDriver, SimRelay) {
        let relay = SimRelay::new(SimEnv::new());
        relay.register_user(3, "ana");
        relay.register_user(7, "bo");
        (SimDriver::new(relay.clone()), relay)
    }

    fn request(url: &str) -> OpenRequest {
        OpenRequest { url: url.to_string(), auth_header: None }
    }

    #[test]
    fn inject_text_queues_keys() {
        let (driver, _relay) = driver();
        driver.inject_line("hi");
        assert!(driver.has_pending());
        assert_eq!(driver.lock().pending_events.len(), 3);
    }

    #[test]
    fn open_reports_opened_then_relay_frames() {
        let (mut driver, _relay) = driver();
        driver.open(&request("ws://h/ws/chat/3_7/?user_id=3"));

        assert_eq!(driver.recv_signal(), Some(DriverSignal::Opened));
        assert!(matches!(driver.recv_signal(), Some(DriverSignal::Text(t)) if t.contains("previous_messages")));
        assert_eq!(driver.recv_signal(), None);
    }

    #[test]
    fn refused_open_reports_failure() {
        let (mut driver, _relay) = driver();
        driver.open(&request("ws://h/ws/chat/3_99/?user_id=3"));

        assert!(matches!(driver.recv_signal(), Some(DriverSignal::Failed { .. })));
        assert!(!driver.is_connected());
    }

    #[tokio::test]
    async fn close_discards_socket_signals() {
        let (mut driver, relay) = driver();
        driver.open(&request("ws://h/ws/chat/3_7/?user_id=3"));
        driver.send_text(r#"{"type":"typing"}"#.into()).await.unwrap();
        driver.pump();

        driver.close();

        assert_eq!(driver.recv_signal(), None);
        assert_eq!(relay.connection_count(), 0);
        assert_eq!(driver.take_sent(), vec![r#"{"type":"typing"}"#.to_string()]);
    }

    #[test]
    fn stop_disconnects_and_marks_stopped() {
        let (mut driver, relay) = driver();
        driver.open(&request("ws://h/ws/chat/3_7/?user_id=3"));
        assert!(!driver.is_stopped());

        driver.stop();

        assert!(driver.is_stopped());
        assert!(!driver.is_connected());
        assert_eq!(relay.connection_count(), 0);
    }

    #[test]
    fn injected_frame_is_delivered_as_text() {
        let (mut driver, _relay) = driver();
        driver.inject_frame(r#"{"type":"typing","username":"bo"}"#);

        assert_eq!(
            driver.recv_signal(),
            Some(DriverSignal::Text(r#"{"type":"typing","username":"bo"}"#.to_string()))
        );
    }
}
