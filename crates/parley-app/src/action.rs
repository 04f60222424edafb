//! Application side-effects and intents.
//!
//! [`AppAction`]s are produced by the [`crate::App`] state machine. The
//! runtime renders, quits, or turns them into session events.

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// The composer text changed. Drives the typing indicator.
    Keystroke,

    /// Send a chat message in the open room.
    SendMessage {
        /// Text as typed. The session trims it and ignores blank sends.
        text: String,
    },

    /// Open the room shared with another user.
    SwitchPeer {
        /// The other participant.
        peer_id: u64,
    },

    /// Mark a received message as read.
    MarkRead {
        /// Server id of the message.
        message_id: u64,
    },

    /// Leave the open room.
    Leave,
}
