//! Session events and actions.

use parley_core::OpenRequest;
use parley_proto::{HistoryRecord, RoomId};

/// Events the caller feeds into the session.
///
/// The caller is responsible for:
/// - Forwarding UI lifecycle (mount, unmount) and user intents
/// - Reporting socket events and history fetch results
/// - Driving time forward via ticks and keystrokes
///
/// Generic over `I` (Instant type) so the typing debounce runs on real or
/// virtual time.
#[derive(Debug, Clone)]
pub enum SessionEvent<I = std::time::Instant> {
    /// Open the room shared with `peer_id`.
    ///
    /// Mounting the current peer again is a no-op. Mounting a different peer
    /// tears the current room down first.
    Mount {
        /// The other participant.
        peer_id: u64,
        /// Bearer token for the socket and history fetch.
        auth_token: Option<String>,
    },

    /// Leave the room. Closes the socket and clears all session state.
    Unmount,

    /// Socket finished opening.
    Opened,

    /// Text frame received on the socket.
    FrameReceived(String),

    /// Socket closed.
    Closed {
        /// Close reason, if the peer sent one.
        reason: Option<String>,
    },

    /// Socket failed to open or broke.
    Failed {
        /// Description of the failure.
        message: String,
    },

    /// History fetch completed.
    HistoryLoaded {
        /// Room the fetch was issued for.
        room_id: RoomId,
        /// Stored messages, oldest first.
        records: Vec<HistoryRecord>,
    },

    /// History fetch failed.
    HistoryFailed {
        /// Room the fetch was issued for.
        room_id: RoomId,
        /// Description of the failure.
        reason: String,
    },

    /// User submitted a message.
    SendMessage {
        /// Message text as typed.
        text: String,
    },

    /// User pressed a key in the composer.
    Keystroke {
        /// Current time from the environment.
        now: I,
    },

    /// User marked a received message as read.
    MarkAsRead {
        /// Server id of the message.
        message_id: u64,
    },

    /// Time tick for the typing debounce.
    Tick {
        /// Current time from the environment.
        now: I,
    },
}

/// Actions the session produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Open the room socket.
    Open(OpenRequest),

    /// Send a text frame on the socket.
    SendFrame(String),

    /// Close the socket.
    Close,

    /// Fetch stored messages for a room and report back with
    /// `HistoryLoaded` or `HistoryFailed`.
    FetchHistory {
        /// Room to fetch.
        room_id: RoomId,
        /// Bearer token for the request.
        auth_token: Option<String>,
    },

    /// Visible state changed.
    Render,
}
