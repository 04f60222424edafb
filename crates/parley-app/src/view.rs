//! Read-only view of application state for renderers.

use std::{ops::Sub, time::Duration};

use parley_client::{ChatSession, Message, TransportState};

use crate::{App, Composer};

/// Everything a renderer needs for one frame.
///
/// Borrowed from the runtime for the duration of a render call.
pub struct ChatView<'a, I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    app: &'a App,
    session: &'a ChatSession<I>,
}

impl<'a, I> ChatView<'a, I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create a view over the app and session.
    pub fn new(app: &'a App, session: &'a ChatSession<I>) -> Self {
        Self { app, session }
    }

    /// Username of the local user.
    pub fn username(&self) -> &'a str {
        &self.session.identity().username
    }

    /// Numeric id of the local user.
    pub fn user_id(&self) -> u64 {
        self.session.identity().user_id
    }

    /// Name of the open room, if any.
    pub fn room(&self) -> Option<&'a str> {
        self.session.room().map(parley_proto::RoomId::as_str)
    }

    /// Peer of the open room, if any.
    pub fn peer_id(&self) -> Option<u64> {
        self.session.peer_id()
    }

    /// Socket state
    pub fn connection_state(&self) -> TransportState {
        self.session.connection_state()
    }

    /// Messages in display order.
    pub fn messages(&self) -> &'a [Message] {
        self.session.messages()
    }

    /// Composer line.
    pub fn composer(&self) -> &'a Composer {
        self.app.composer()
    }

    /// Peers currently typing.
    pub fn typing_users(&self) -> &'a [String] {
        self.session.typing_users()
    }

    /// Typing indicator text, `None` when nobody is typing.
    pub fn typing_line(&self) -> Option<String> {
        match self.typing_users() {
            [] => None,
            [one] => Some(format!("{one} is typing...")),
            many => Some(format!("{} are typing...", many.join(", "))),
        }
    }

    /// Status text. A server error takes precedence over the app's own
    /// status message.
    pub fn status(&self) -> Option<&'a str> {
        self.session.server_error().or_else(|| self.app.status_message())
    }
}
