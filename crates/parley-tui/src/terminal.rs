//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering. The room socket runs on a
//! tokio task via [`parley_client::transport`]; history fetches run on their
//! own tasks and report back over a channel.

use std::{
    collections::VecDeque,
    io::{self, Stdout, stdout},
    time::{Duration, Instant},
};

use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use parley_app::{AppEvent, ChatView, Driver, DriverSignal, KeyInput};
use parley_client::{
    OpenRequest,
    api::ApiClient,
    transport::{SocketEvent, SocketHandle, open_socket},
};
use parley_proto::RoomId;
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::ui;

/// Idle wait before `poll_event` returns so the runtime can tick.
const TICK: Duration = Duration::from_millis(100);

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Terminal driver implementing the [`Driver`] trait.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    api: ApiClient,
    socket: Option<SocketHandle>,
    /// Events of the current socket only. Replaced on every open, so a
    /// closed socket's late events are never seen.
    socket_events: Option<mpsc::Receiver<SocketEvent>>,
    history_tx: mpsc::Sender<DriverSignal>,
    history_rx: mpsc::Receiver<DriverSignal>,
    ready: VecDeque<DriverSignal>,
}

impl TerminalDriver {
    /// Take over the terminal. `api` is used for history fetches.
    pub fn new(api: ApiClient) -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;
        let (history_tx, history_rx) = mpsc::channel(8);

        Ok(Self {
            terminal,
            event_stream: EventStream::new(),
            api,
            socket: None,
            socket_events: None,
            history_tx,
            history_rx,
            ready: VecDeque::new(),
        })
    }

    /// Convert a crossterm key event to `KeyInput`. Ctrl-C quits like Esc.
    fn convert_key(key: KeyEvent) -> Option<KeyInput> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return matches!(key.code, KeyCode::Char('c')).then_some(KeyInput::Esc);
        }

        match key.code {
            KeyCode::Char(c) => Some(KeyInput::Char(c)),
            KeyCode::Enter => Some(KeyInput::Enter),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            KeyCode::Delete => Some(KeyInput::Delete),
            KeyCode::Esc => Some(KeyInput::Esc),
            KeyCode::Left => Some(KeyInput::Left),
            KeyCode::Right => Some(KeyInput::Right),
            KeyCode::Home => Some(KeyInput::Home),
            KeyCode::End => Some(KeyInput::End),
            _ => None,
        }
    }
}

fn socket_signal(event: SocketEvent) -> DriverSignal {
    match event {
        SocketEvent::Opened => DriverSignal::Opened,
        SocketEvent::Text(text) => DriverSignal::Text(text),
        SocketEvent::Closed { reason } => DriverSignal::Closed { reason },
        SocketEvent::Failed(message) => DriverSignal::Failed { message },
    }
}

async fn next_socket_event(events: &mut Option<mpsc::Receiver<SocketEvent>>) -> Option<SocketEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;
    type Instant = Instant;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, Self::Error> {
        tokio::select! {
            biased;

            // Terminal events
            maybe_event = self.event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        Ok(Self::convert_key(key).map(AppEvent::Key))
                    },
                    Some(Ok(Event::Resize(cols, rows))) => Ok(Some(AppEvent::Resize(cols, rows))),
                    Some(Err(e)) => Err(TerminalError::Io(e)),
                    _ => Ok(None),
                }
            }

            // Socket traffic wakes the loop early
            Some(event) = next_socket_event(&mut self.socket_events) => {
                self.ready.push_back(socket_signal(event));
                Ok(None)
            }

            Some(signal) = self.history_rx.recv() => {
                self.ready.push_back(signal);
                Ok(None)
            }

            // Tick timeout
            () = tokio::time::sleep(TICK) => Ok(Some(AppEvent::Tick)),
        }
    }

    fn open(&mut self, request: &OpenRequest) {
        let (events_tx, events_rx) = mpsc::channel(64);
        match open_socket(request, events_tx) {
            Ok(handle) => {
                self.socket = Some(handle);
                self.socket_events = Some(events_rx);
            },
            Err(e) => {
                tracing::warn!(error = %e, "socket request rejected");
                self.ready.push_back(DriverSignal::Failed { message: e.to_string() });
            },
        }
    }

    async fn send_text(&mut self, text: String) -> Result<(), Self::Error> {
        if let Some(socket) = &self.socket
            && socket.to_server.send(text).await.is_err()
        {
            // The socket task has ended; its Closed or Failed event is queued.
            tracing::debug!("send after socket task ended");
        }
        Ok(())
    }

    fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            socket.close();
        }
        self.socket_events = None;
        self.ready.retain(|s| {
            matches!(s, DriverSignal::HistoryLoaded { .. } | DriverSignal::HistoryFailed { .. })
        });
    }

    fn fetch_history(&mut self, room_id: RoomId, auth_token: Option<String>) {
        let api = match auth_token {
            Some(token) => self.api.clone().with_token(token),
            None => self.api.clone(),
        };
        let results = self.history_tx.clone();

        tokio::spawn(async move {
            let signal = match api.messages(&room_id).await {
                Ok(records) => DriverSignal::HistoryLoaded { room_id, records },
                Err(e) => DriverSignal::HistoryFailed { room_id, reason: e.to_string() },
            };
            let _ = results.send(signal).await;
        });
    }

    fn recv_signal(&mut self) -> Option<DriverSignal> {
        if let Some(signal) = self.ready.pop_front() {
            return Some(signal);
        }
        if let Some(events) = &mut self.socket_events
            && let Ok(event) = events.try_recv()
        {
            return Some(socket_signal(event));
        }
        self.history_rx.try_recv().ok()
    }

    fn render(&mut self, view: &ChatView<'_, Instant>) -> Result<(), Self::Error> {
        self.terminal.draw(|frame| ui::render(frame, view))?;
        Ok(())
    }

    fn stop(&mut self) {
        self.close();
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.stop();
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}
