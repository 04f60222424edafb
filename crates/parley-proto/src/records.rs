//! Message and user records.
//!
//! Shapes returned by the REST API and carried inside chat envelopes. The
//! backend is not consistent about field names across endpoints, so the
//! history record accepts both forms it has been observed to emit.

use serde::{Deserialize, Serialize};

/// A user as returned by the login and user-list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Numeric user id. Room names are derived from these.
    pub id: u64,
    /// Login name. Chat envelopes identify senders by this.
    pub username: String,
    /// Contact address, if the server exposes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Successful login response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for REST calls and the socket endpoint.
    pub token: String,
    /// The authenticated user.
    pub user: UserRecord,
}

/// A stored message as returned by the history endpoint.
///
/// The socket's `previous_messages` payload uses `message` and `username`;
/// the REST endpoint uses `content` and a nested `sender`. Both decode here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Server-assigned message id.
    pub id: u64,
    /// Message text.
    #[serde(alias = "content")]
    pub message: String,
    /// Sender's username (flat form).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Sender record (nested form).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<UserRecord>,
    /// Server timestamp, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Whether the recipient has read the message.
    #[serde(default)]
    pub read: bool,
}

impl HistoryRecord {
    /// Sender's username from whichever form the record carries.
    ///
    /// Returns the empty string if neither is present.
    pub fn sender_username(&self) -> &str {
        self.username
            .as_deref()
            .or_else(|| self.sender.as_ref().map(|s| s.username.as_str()))
            .unwrap_or_default()
    }
}

/// A chat message broadcast live on the room socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveMessage {
    /// Server-assigned message id.
    pub id: u64,
    /// Message text.
    pub message: String,
    /// Sender's username.
    pub username: String,
    /// Server timestamp, verbatim. Absent on some relays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Whether the recipient has read the message.
    #[serde(default)]
    pub read: bool,
}
