//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture what a client shows at a point in time. Invariants
//! operate on snapshots rather than live state so each check sees one
//! consistent view.

use parley_client::MessageId;

/// Snapshot of every client in a simulation.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Per-client state snapshots.
    pub clients: Vec<ClientSnapshot>,
}

impl SystemSnapshot {
    /// Create an empty snapshot (no clients).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot with a single client.
    pub fn single(client: ClientSnapshot) -> Self {
        Self { clients: vec![client] }
    }

    /// Create a snapshot from multiple clients.
    pub fn from_clients(clients: Vec<ClientSnapshot>) -> Self {
        Self { clients }
    }
}

/// Snapshot of a single client's observable state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSnapshot {
    /// Local username.
    pub username: String,
    /// Local user id.
    pub user_id: u64,
    /// Peer of the open room.
    pub peer_id: Option<u64>,
    /// Name of the open room.
    pub room: Option<String>,
    /// Peers shown as typing.
    pub typing_users: Vec<String>,
    /// Messages shown, in order.
    pub messages: Vec<MessageSnapshot>,
}

impl ClientSnapshot {
    /// Contents of the shown messages, in order.
    pub fn contents(&self) -> Vec<&str> {
        self.messages.iter().map(|m| m.content.as_str()).collect()
    }
}

/// One shown message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSnapshot {
    /// Server or local id.
    pub id: MessageId,
    /// Sender username.
    pub sender: String,
    /// Message text.
    pub content: String,
}
