//! Session configuration.

use std::time::Duration;

use parley_core::{AuthPlacement, DEFAULT_TYPING_TIMEOUT};

/// Default socket base URL. The room name and query are appended per session.
pub const DEFAULT_WS_BASE: &str = "ws://127.0.0.1:8000/ws/chat";

/// How a sent message reaches the local view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendMode {
    /// Append immediately under a temporary id; the server echo confirms it.
    #[default]
    Optimistic,
    /// Append nothing locally; wait for the server's broadcast.
    EchoTrust,
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Socket base URL, e.g. `wss://host/ws/chat`
    pub ws_base: String,
    /// Optimistic or echo-trust sends
    pub send_mode: SendMode,
    /// Where the auth token travels on connect
    pub auth_placement: AuthPlacement,
    /// Idle time before `stop_typing`
    pub typing_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ws_base: DEFAULT_WS_BASE.to_string(),
            send_mode: SendMode::default(),
            auth_placement: AuthPlacement::default(),
            typing_timeout: DEFAULT_TYPING_TIMEOUT,
        }
    }
}
