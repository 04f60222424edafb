//! In-memory chat backend.
//!
//! `SimRelay` plays the server side of the room socket and the history
//! endpoint the way the production backend does:
//!
//! - On connect it sends `previous_messages` for the room, then marks every
//!   stored message in the room read.
//! - A `message` command is stored and broadcast untagged to every socket in
//!   the room, the sender included.
//! - `typing`, `stop_typing` and `mark_as_read` are re-broadcast to every
//!   socket in the room, the sender included.
//! - An inactive user's `message` gets `{"error": "User not authenticated"}`
//!   on their own socket and nothing else happens.
//!
//! Deliveries wait in per-connection inboxes until the driver collects them.

use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use parley_core::Environment;
use parley_proto::{HistoryRecord, RoomId, UserRecord};
use serde_json::{Value, json};
use url::Url;

use crate::SimEnv;

/// Connection identifier assigned by the relay.
pub type ConnId = u64;

/// Reasons the relay refuses a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// URL does not parse or does not address a chat room.
    NotFound(String),
    /// User id missing or not registered.
    UnknownUser(String),
    /// History endpoint is switched off.
    Unavailable,
}

impl std::fmt::Display for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "404 not found: {path}"),
            Self::UnknownUser(who) => write!(f, "unknown user: {who}"),
            Self::Unavailable => write!(f, "503 service unavailable"),
        }
    }
}

impl std::error::Error for RelayError {}

#[derive(Debug)]
struct User {
    username: String,
    active: bool,
}

#[derive(Debug)]
struct Stored {
    id: u64,
    room: RoomId,
    sender_id: u64,
    content: String,
    timestamp: String,
    read: bool,
}

#[derive(Debug)]
struct Connection {
    user_id: u64,
    room: RoomId,
    inbox: VecDeque<String>,
}

#[derive(Debug)]
struct RelayState {
    users: BTreeMap<u64, User>,
    messages: Vec<Stored>,
    connections: BTreeMap<ConnId, Connection>,
    next_conn: ConnId,
    next_message_id: u64,
    history_available: bool,
}

impl Default for RelayState {
    fn default() -> Self {
        Self {
            users: BTreeMap::new(),
            messages: Vec::new(),
            connections: BTreeMap::new(),
            next_conn: 1,
            next_message_id: 1,
            history_available: true,
        }
    }
}

impl RelayState {
    fn username(&self, user_id: u64) -> &str {
        self.users.get(&user_id).map_or("", |u| u.username.as_str())
    }

    fn broadcast(&mut self, room: &RoomId, frame: &Value) {
        let text = frame.to_string();
        for connection in self.connections.values_mut().filter(|c| &c.room == room) {
            connection.inbox.push_back(text.clone());
        }
    }
}

/// Emulated backend shared by every client in a simulation.
#[derive(Debug, Clone)]
pub struct SimRelay {
    state: Arc<Mutex<RelayState>>,
    env: SimEnv,
}

impl SimRelay {
    /// Empty relay stamping messages with `env`'s clock.
    pub fn new(env: SimEnv) -> Self {
        Self { state: Arc::new(Mutex::new(RelayState::default())), env }
    }

    fn lock(&self) -> MutexGuard<'_, RelayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an active user.
    pub fn register_user(&self, user_id: u64, username: impl Into<String>) {
        self.lock().users.insert(user_id, User { username: username.into(), active: true });
    }

    /// Mark a user inactive. Their chat messages are rejected from now on.
    pub fn deactivate(&self, user_id: u64) {
        if let Some(user) = self.lock().users.get_mut(&user_id) {
            user.active = false;
        }
    }

    /// Switch the history endpoint on or off.
    pub fn set_history_available(&self, available: bool) {
        self.lock().history_available = available;
    }

    /// Accept a socket for `url` (`.../ws/chat/{room}/?user_id=N`).
    ///
    /// # Errors
    ///
    /// - `RelayError::NotFound` if the URL does not name a room
    /// - `RelayError::UnknownUser` if the caller or a participant is not
    ///   registered
    pub fn connect(&self, url: &str) -> Result<ConnId, RelayError> {
        let parsed = Url::parse(url).map_err(|_| RelayError::NotFound(url.to_string()))?;
        let room = room_from_path(&parsed).ok_or_else(|| RelayError::NotFound(url.to_string()))?;

        let user_id = parsed
            .query_pairs()
            .find(|(key, _)| key == "user_id")
            .and_then(|(_, value)| value.parse::<u64>().ok())
            .ok_or_else(|| RelayError::UnknownUser("missing user_id".to_string()))?;

        let mut state = self.lock();
        let (low, high) = room.participants().ok_or_else(|| RelayError::NotFound(room.to_string()))?;
        for id in [user_id, low, high] {
            if !state.users.contains_key(&id) {
                return Err(RelayError::UnknownUser(id.to_string()));
            }
        }

        let previous: Vec<Value> = state
            .messages
            .iter()
            .filter(|m| m.room == room)
            .map(|m| {
                json!({
                    "id": m.id,
                    "username": state.username(m.sender_id),
                    "message": m.content,
                    "timestamp": m.timestamp,
                    "read": m.read,
                })
            })
            .collect();

        for message in state.messages.iter_mut().filter(|m| m.room == room) {
            message.read = true;
        }

        let conn = state.next_conn;
        state.next_conn += 1;

        let hello = json!({"type": "previous_messages", "messages": previous}).to_string();
        state
            .connections
            .insert(conn, Connection { user_id, room: room.clone(), inbox: VecDeque::from([hello]) });

        tracing::debug!(conn, user_id, room = %room, "relay accepted socket");
        Ok(conn)
    }

    /// Process a text frame from `conn`.
    pub fn receive(&self, conn: ConnId, text: &str) {
        let timestamp = format!("{}ms", self.env.now().as_millis());
        let mut state = self.lock();

        let Some(connection) = state.connections.get(&conn) else {
            return;
        };
        let (user_id, room) = (connection.user_id, connection.room.clone());

        let Ok(data) = serde_json::from_str::<Value>(text) else {
            tracing::warn!(conn, "relay dropped malformed frame");
            return;
        };

        match data.get("type").and_then(Value::as_str).unwrap_or("message") {
            "message" => {
                let active = state.users.get(&user_id).is_some_and(|u| u.active);
                if !active {
                    if let Some(connection) = state.connections.get_mut(&conn) {
                        let error = json!({"error": "User not authenticated"}).to_string();
                        connection.inbox.push_back(error);
                    }
                    return;
                }

                let Some(content) = data.get("message").and_then(Value::as_str) else {
                    tracing::warn!(conn, "relay dropped message without text");
                    return;
                };

                let id = state.next_message_id;
                state.next_message_id += 1;
                state.messages.push(Stored {
                    id,
                    room: room.clone(),
                    sender_id: user_id,
                    content: content.to_string(),
                    timestamp: timestamp.clone(),
                    read: false,
                });

                let frame = json!({
                    "message": content,
                    "username": state.username(user_id),
                    "timestamp": timestamp,
                    "id": id,
                    "read": false,
                });
                state.broadcast(&room, &frame);
            },
            kind @ ("typing" | "stop_typing") => {
                let frame = json!({"type": kind, "username": state.username(user_id)});
                state.broadcast(&room, &frame);
            },
            "mark_as_read" => {
                let message_id = data.get("message_id").and_then(Value::as_u64).unwrap_or(0);
                if let Some(message) = state.messages.iter_mut().find(|m| m.id == message_id) {
                    message.read = true;
                }
                state.broadcast(&room, &json!({"type": "mark_as_read", "message_id": message_id}));
            },
            other => tracing::debug!(conn, kind = other, "relay ignored command"),
        }
    }

    /// Drop a connection. Undelivered frames are discarded.
    pub fn disconnect(&self, conn: ConnId) {
        self.lock().connections.remove(&conn);
    }

    /// Take frames waiting for `conn`.
    pub fn take_inbox(&self, conn: ConnId) -> Vec<String> {
        self.lock()
            .connections
            .get_mut(&conn)
            .map(|c| c.inbox.drain(..).collect())
            .unwrap_or_default()
    }

    /// Stored messages for `room`, oldest first, in the history endpoint's
    /// shape (`content` plus nested `sender`, no read flag).
    ///
    /// # Errors
    ///
    /// - `RelayError::Unavailable` if history is switched off
    pub fn history(&self, room: &RoomId) -> Result<Vec<HistoryRecord>, RelayError> {
        let state = self.lock();
        if !state.history_available {
            return Err(RelayError::Unavailable);
        }

        Ok(state
            .messages
            .iter()
            .filter(|m| &m.room == room)
            .map(|m| HistoryRecord {
                id: m.id,
                message: m.content.clone(),
                username: None,
                sender: Some(UserRecord {
                    id: m.sender_id,
                    username: state.username(m.sender_id).to_string(),
                    email: None,
                    name: None,
                }),
                timestamp: Some(m.timestamp.clone()),
                read: false,
            })
            .collect())
    }

    /// Store a message without a socket, like the REST send endpoint.
    /// Nothing is broadcast.
    ///
    /// # Errors
    ///
    /// - `RelayError::UnknownUser` if either user is not registered
    pub fn post_message(
        &self,
        sender_id: u64,
        recipient_id: u64,
        content: &str,
    ) -> Result<u64, RelayError> {
        let timestamp = format!("{}ms", self.env.now().as_millis());
        let mut state = self.lock();
        for id in [sender_id, recipient_id] {
            if !state.users.contains_key(&id) {
                return Err(RelayError::UnknownUser(id.to_string()));
            }
        }

        let id = state.next_message_id;
        state.next_message_id += 1;
        state.messages.push(Stored {
            id,
            room: RoomId::between(sender_id, recipient_id),
            sender_id,
            content: content.to_string(),
            timestamp,
            read: false,
        });
        Ok(id)
    }

    /// Whether the stored message is marked read.
    pub fn is_read(&self, message_id: u64) -> Option<bool> {
        self.lock().messages.iter().find(|m| m.id == message_id).map(|m| m.read)
    }

    /// Number of stored messages in `room`.
    pub fn stored_count(&self, room: &RoomId) -> usize {
        self.lock().messages.iter().filter(|m| &m.room == room).count()
    }

    /// Number of open sockets.
    pub fn connection_count(&self) -> usize {
        self.lock().connections.len()
    }
}

fn room_from_path(url: &Url) -> Option<RoomId> {
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [.., "chat", room] => room.parse().ok(),
        _ => None,
    }
}
