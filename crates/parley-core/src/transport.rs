//! Room socket state machine.
//!
//! Tracks the lifecycle of one WebSocket connection to one room. Like the rest
//! of the core it performs no I/O: `connect`, `send` and `disconnect` return
//! [`TransportAction`]s for the driver to execute, and the driver reports
//! socket events back through the `handle_*` methods.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ connect ┌────────────┐  opened  ┌──────┐
//! │ Idle │────────>│ Connecting │─────────>│ Open │
//! └──────┘         └────────────┘          └──────┘
//!                        │                    │
//!                        │ error/closed       │ error/closed/disconnect
//!                        ↓                    ↓
//!                   ┌────────┐           ┌────────┐
//!                   │ Closed │<──────────│ Closed │
//!                   └────────┘           └────────┘
//! ```
//!
//! Closing is terminal until the next `connect`. There is no retry.

use parley_proto::{Envelope, Outbound, RoomId, room_endpoint};

use crate::error::TransportError;

/// Where the auth token travels when opening the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPlacement {
    /// `token` query parameter next to `user_id`
    #[default]
    Query,
    /// `Authorization: Bearer` header on the upgrade request
    Header,
}

/// Transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// No connection attempted yet
    Idle,
    /// Open requested, waiting for the socket to come up
    Connecting,
    /// Socket is open
    Open,
    /// Socket closed (graceful, failed, or never opened)
    Closed,
}

/// Parameters for opening the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    /// Full socket URL including the query string
    pub url: String,
    /// `Authorization` header value, when auth travels in a header
    pub auth_header: Option<String>,
}

/// Actions returned by the transport state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportAction {
    /// Open a socket with these parameters
    Open(OpenRequest),
    /// Send this text frame
    Send(String),
    /// Close the socket
    Close,
}

/// Connection state machine for one room socket.
#[derive(Debug, Clone)]
pub struct TransportSession {
    state: TransportState,
    ws_base: String,
    auth_placement: AuthPlacement,
    room: Option<RoomId>,
}

impl TransportSession {
    /// Create a session in [`TransportState::Idle`].
    pub fn new(ws_base: impl Into<String>, auth_placement: AuthPlacement) -> Self {
        Self { state: TransportState::Idle, ws_base: ws_base.into(), auth_placement, room: None }
    }

    /// Current state
    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Start connecting to a room.
    ///
    /// Returns exactly one `Open` action. Failure to establish the connection
    /// is not reported here; the driver reports it later through
    /// [`handle_error`](Self::handle_error) or
    /// [`handle_closed`](Self::handle_closed).
    ///
    /// # Errors
    ///
    /// - `TransportError::InvalidState` if a connection is in flight or open
    /// - `TransportError::Endpoint` if the socket URL cannot be built
    pub fn connect(
        &mut self,
        room: RoomId,
        user_id: u64,
        token: Option<&str>,
    ) -> Result<TransportAction, TransportError> {
        if !matches!(self.state, TransportState::Idle | TransportState::Closed) {
            return Err(TransportError::InvalidState { state: self.state, operation: "connect" });
        }

        let (query_token, auth_header) = match self.auth_placement {
            AuthPlacement::Query => (token, None),
            AuthPlacement::Header => (None, token.map(|t| format!("Bearer {t}"))),
        };
        let url = room_endpoint(&self.ws_base, &room, user_id, query_token)?;

        tracing::info!(room = %room, "connecting");

        self.room = Some(room);
        self.state = TransportState::Connecting;

        Ok(TransportAction::Open(OpenRequest { url: url.into(), auth_header }))
    }

    /// Socket reported open.
    ///
    /// Returns true on the transition into `Open`, false if the event is
    /// stale (e.g. the session was disconnected while connecting).
    pub fn handle_opened(&mut self) -> bool {
        if self.state != TransportState::Connecting {
            tracing::debug!(state = ?self.state, "ignoring open event");
            return false;
        }

        self.state = TransportState::Open;
        true
    }

    /// Decode an inbound text frame.
    ///
    /// Malformed frames and unknown envelope types are logged and dropped;
    /// they never change the connection state.
    pub fn handle_text(&self, text: &str) -> Option<Envelope> {
        if self.state != TransportState::Open {
            tracing::debug!(state = ?self.state, "dropping frame received while not open");
            return None;
        }

        match Envelope::decode(text) {
            Ok(envelope) => Some(envelope),
            Err(err) if err.is_unknown_type() => {
                tracing::debug!(%err, "ignoring envelope");
                None
            },
            Err(err) => {
                tracing::warn!(%err, "dropping malformed frame");
                None
            },
        }
    }

    /// Socket closed by the peer or the network.
    pub fn handle_closed(&mut self) {
        if self.state != TransportState::Closed {
            tracing::info!(state = ?self.state, "socket closed");
        }
        self.state = TransportState::Closed;
    }

    /// Socket failed. Treated as a close; there is no retry.
    pub fn handle_error(&mut self, message: &str) {
        tracing::warn!(state = ?self.state, error = message, "socket error");
        self.state = TransportState::Closed;
    }

    /// Send a command.
    ///
    /// Returns nothing when the socket is not open. The command is dropped and
    /// logged; callers check connectivity if they care.
    pub fn send(&self, command: &Outbound) -> Option<TransportAction> {
        if self.state != TransportState::Open {
            tracing::warn!(state = ?self.state, ?command, "dropping send while not open");
            return None;
        }

        match command.encode() {
            Ok(text) => Some(TransportAction::Send(text)),
            Err(err) => {
                tracing::warn!(%err, "dropping unencodable command");
                None
            },
        }
    }

    /// Close the connection. Idempotent.
    ///
    /// Returns `Close` only when there is something to close.
    pub fn disconnect(&mut self) -> Option<TransportAction> {
        match self.state {
            TransportState::Connecting | TransportState::Open => {
                tracing::info!(room = ?self.room, "disconnecting");
                self.state = TransportState::Closed;
                Some(TransportAction::Close)
            },
            TransportState::Idle | TransportState::Closed => None,
        }
    }
}
