//! Standard invariant checks.

use std::collections::HashSet;

use parley_client::MessageId;
use parley_proto::RoomId;

use super::{Invariant, InvariantResult, SystemSnapshot};

/// The local user never appears in their own typing indicator.
///
/// The server echoes typing frames to the sender too; they must be filtered.
pub struct TypingExcludesLocalUser;

impl Invariant for TypingExcludesLocalUser {
    fn name(&self) -> &'static str {
        "TypingExcludesLocalUser"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if client.typing_users.contains(&client.username) {
                return Err(self.violation(format!(
                    "{} sees themselves typing: {:?}",
                    client.username, client.typing_users
                )));
            }
        }
        Ok(())
    }
}

/// Each typing user is listed once, however many typing frames arrived.
pub struct TypingUsersUnique;

impl Invariant for TypingUsersUnique {
    fn name(&self) -> &'static str {
        "TypingUsersUnique"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let unique: HashSet<&String> = client.typing_users.iter().collect();
            if unique.len() != client.typing_users.len() {
                return Err(self.violation(format!(
                    "{} lists duplicates: {:?}",
                    client.username, client.typing_users
                )));
            }
        }
        Ok(())
    }
}

/// Messages still waiting for their echo were sent by the local user.
pub struct PendingOnlyFromLocalUser;

impl Invariant for PendingOnlyFromLocalUser {
    fn name(&self) -> &'static str {
        "PendingOnlyFromLocalUser"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let foreign = client
                .messages
                .iter()
                .find(|m| matches!(m.id, MessageId::Local(_)) && m.sender != client.username);
            if let Some(message) = foreign {
                return Err(self.violation(format!(
                    "{} holds pending message from {}: {:?}",
                    client.username, message.sender, message.content
                )));
            }
        }
        Ok(())
    }
}

/// A server message id appears at most once in a client's list.
pub struct ServerIdsUnique;

impl Invariant for ServerIdsUnique {
    fn name(&self) -> &'static str {
        "ServerIdsUnique"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let mut seen = HashSet::new();
            for message in &client.messages {
                if let MessageId::Server(id) = message.id
                    && !seen.insert(id)
                {
                    return Err(self.violation(format!(
                        "{} shows message {id} twice",
                        client.username
                    )));
                }
            }
        }
        Ok(())
    }
}

/// With no room open, nothing room-scoped is shown.
pub struct NoRoomStateWhenUnmounted;

impl Invariant for NoRoomStateWhenUnmounted {
    fn name(&self) -> &'static str {
        "NoRoomStateWhenUnmounted"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in state.clients.iter().filter(|c| c.room.is_none()) {
            if !client.messages.is_empty() || !client.typing_users.is_empty() {
                return Err(self.violation(format!(
                    "{} has no room but shows {} messages and typers {:?}",
                    client.username,
                    client.messages.len(),
                    client.typing_users
                )));
            }
        }
        Ok(())
    }
}

/// The open room is the canonical name for the local user and the peer.
pub struct RoomIdCanonical;

impl Invariant for RoomIdCanonical {
    fn name(&self) -> &'static str {
        "RoomIdCanonical"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let expected = client.peer_id.map(|peer| RoomId::between(client.user_id, peer));
            let actual = client.room.as_deref();
            if expected.as_ref().map(RoomId::as_str) != actual {
                return Err(self.violation(format!(
                    "{} (user {}) with peer {:?} shows room {actual:?}",
                    client.username, client.user_id, client.peer_id
                )));
            }
        }
        Ok(())
    }
}
