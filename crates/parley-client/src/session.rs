//! Chat session state machine.
//!
//! [`ChatSession`] binds one transport, one reconciler and one typing
//! coordinator to at most one mounted room. Everything it owns is reset when
//! the room changes; there is no incremental carry-over between rooms.

use std::{ops::Sub, time::Duration};

use parley_core::{
    AppendOutcome, Message, Reconciler, TransportAction, TransportSession, TransportState,
    TypingCoordinator,
};
use parley_proto::{Envelope, HistoryRecord, Outbound, RoomId};

use crate::{
    config::{SendMode, SessionConfig},
    error::SessionError,
    event::{SessionAction, SessionEvent},
};

/// Who the local user is.
///
/// Supplied by the auth collaborator at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Numeric user id, used for the room name and `sender_id`.
    pub user_id: u64,
    /// Username, used to recognize the local user's own frames.
    pub username: String,
}

impl Identity {
    /// Create an identity.
    pub fn new(user_id: u64, username: impl Into<String>) -> Self {
        Self { user_id, username: username.into() }
    }
}

#[derive(Debug, Clone)]
struct Mounted {
    peer_id: u64,
    room: RoomId,
    auth_token: Option<String>,
}

/// Controller for one chat room at a time.
#[derive(Debug, Clone)]
pub struct ChatSession<I = std::time::Instant>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    identity: Identity,
    send_mode: SendMode,
    transport: TransportSession,
    reconciler: Reconciler,
    typing: TypingCoordinator<I>,
    mounted: Option<Mounted>,
    server_error: Option<String>,
}

impl<I> ChatSession<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create an unmounted session.
    pub fn new(identity: Identity, config: SessionConfig) -> Self {
        Self {
            transport: TransportSession::new(config.ws_base, config.auth_placement),
            reconciler: Reconciler::new(identity.username.clone()),
            typing: TypingCoordinator::new(config.typing_timeout),
            send_mode: config.send_mode,
            identity,
            mounted: None,
            server_error: None,
        }
    }

    /// Local user
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Mounted room, if any.
    pub fn room(&self) -> Option<&RoomId> {
        self.mounted.as_ref().map(|m| &m.room)
    }

    /// Peer of the mounted room, if any.
    pub fn peer_id(&self) -> Option<u64> {
        self.mounted.as_ref().map(|m| m.peer_id)
    }

    /// Socket state
    pub fn connection_state(&self) -> TransportState {
        self.transport.state()
    }

    /// Reconciled messages, in arrival order.
    pub fn messages(&self) -> &[Message] {
        self.reconciler.messages()
    }

    /// Peers currently typing.
    pub fn typing_users(&self) -> &[String] {
        self.typing.typing_users()
    }

    /// Whether the local typing timer is pending.
    pub fn is_local_typing(&self) -> bool {
        self.typing.is_local_typing()
    }

    /// Last error notice from the server, cleared on the next mount.
    pub fn server_error(&self) -> Option<&str> {
        self.server_error.as_deref()
    }

    /// Process an event and return actions to execute.
    ///
    /// # Errors
    ///
    /// - `SessionError::SelfRoom` when mounting a room with the local user
    /// - `SessionError::NotMounted` for user intents with no room mounted
    /// - `SessionError::Transport` if the socket URL cannot be built
    pub fn handle(&mut self, event: SessionEvent<I>) -> Result<Vec<SessionAction>, SessionError> {
        match event {
            SessionEvent::Mount { peer_id, auth_token } => self.mount(peer_id, auth_token),
            SessionEvent::Unmount => Ok(self.unmount()),
            SessionEvent::Opened => Ok(self.handle_opened()),
            SessionEvent::FrameReceived(text) => Ok(self.handle_frame(&text)),
            SessionEvent::Closed { reason } => {
                tracing::info!(reason = reason.as_deref().unwrap_or(""), "socket closed");
                self.transport.handle_closed();
                Ok(self.after_disconnect())
            },
            SessionEvent::Failed { message } => {
                self.transport.handle_error(&message);
                Ok(self.after_disconnect())
            },
            SessionEvent::HistoryLoaded { room_id, records } => {
                Ok(self.handle_history(&room_id, Ok(records)))
            },
            SessionEvent::HistoryFailed { room_id, reason } => {
                Ok(self.handle_history(&room_id, Err(reason)))
            },
            SessionEvent::SendMessage { text } => self.send_message(&text),
            SessionEvent::Keystroke { now } => self.keystroke(now),
            SessionEvent::MarkAsRead { message_id } => self.mark_as_read(message_id),
            SessionEvent::Tick { now } => Ok(self.tick(now)),
        }
    }

    fn mount(
        &mut self,
        peer_id: u64,
        auth_token: Option<String>,
    ) -> Result<Vec<SessionAction>, SessionError> {
        if peer_id == self.identity.user_id {
            return Err(SessionError::SelfRoom(peer_id));
        }

        // Same room is a no-op unless its socket is gone; then it reconnects.
        if self.peer_id() == Some(peer_id) && self.transport.state() != TransportState::Closed {
            return Ok(vec![]);
        }

        let mut actions = self.teardown().unwrap_or_default();

        let room = RoomId::between(self.identity.user_id, peer_id);
        let open =
            self.transport.connect(room.clone(), self.identity.user_id, auth_token.as_deref())?;

        self.mounted = Some(Mounted { peer_id, room, auth_token });
        self.server_error = None;

        actions.push(transport_action(open));
        actions.push(SessionAction::Render);
        Ok(actions)
    }

    fn unmount(&mut self) -> Vec<SessionAction> {
        let Some(mut actions) = self.teardown() else {
            return vec![];
        };
        actions.push(SessionAction::Render);
        actions
    }

    /// Close the socket and clear every piece of room state.
    ///
    /// The typing timer is cancelled without sending `stop_typing`. Returns
    /// `None` if nothing was mounted.
    fn teardown(&mut self) -> Option<Vec<SessionAction>> {
        let mounted = self.mounted.take()?;

        tracing::info!(room = %mounted.room, "unmounting");

        self.typing.cancel();
        self.typing.clear_remote();
        self.reconciler.reset();

        Some(self.transport.disconnect().map(transport_action).into_iter().collect())
    }

    fn handle_opened(&mut self) -> Vec<SessionAction> {
        if !self.transport.handle_opened() {
            return vec![];
        }

        let Some(mounted) = &self.mounted else {
            return vec![];
        };

        vec![
            SessionAction::FetchHistory {
                room_id: mounted.room.clone(),
                auth_token: mounted.auth_token.clone(),
            },
            SessionAction::Render,
        ]
    }

    fn handle_frame(&mut self, text: &str) -> Vec<SessionAction> {
        let Some(envelope) = self.transport.handle_text(text) else {
            return vec![];
        };

        let changed = match envelope {
            Envelope::Message(message) => {
                let outcome = self.reconciler.append_live(message);
                outcome != AppendOutcome::Queued
            },
            Envelope::Typing { username } => {
                username != self.identity.username && self.typing.on_remote_typing(&username)
            },
            Envelope::StopTyping { username } => {
                username != self.identity.username && self.typing.on_remote_stop_typing(&username)
            },
            Envelope::PreviousMessages { messages } => {
                tracing::debug!(count = messages.len(), "ignoring socket history");
                false
            },
            Envelope::MarkAsRead { message_id } => self.reconciler.mark_read(message_id),
            Envelope::Error { error } => {
                tracing::warn!(error = %error, "server rejected command");
                self.server_error = Some(error);
                true
            },
        };

        if changed { vec![SessionAction::Render] } else { vec![] }
    }

    fn after_disconnect(&mut self) -> Vec<SessionAction> {
        // Nobody can receive our stop_typing now, and peers' stop frames are lost.
        self.typing.cancel();
        self.typing.clear_remote();
        vec![SessionAction::Render]
    }

    fn handle_history(
        &mut self,
        room_id: &RoomId,
        result: Result<Vec<HistoryRecord>, String>,
    ) -> Vec<SessionAction> {
        if self.room() != Some(room_id) {
            tracing::debug!(room = %room_id, "dropping history for unmounted room");
            return vec![];
        }

        match result {
            Ok(records) => self.reconciler.load_history(records),
            Err(reason) => {
                tracing::warn!(room = %room_id, reason = %reason, "history fetch failed");
                self.reconciler.abandon_history();
            },
        }
        vec![SessionAction::Render]
    }

    fn send_message(&mut self, text: &str) -> Result<Vec<SessionAction>, SessionError> {
        self.require_mounted()?;

        let text = text.trim();
        if text.is_empty() {
            return Ok(vec![]);
        }

        let command =
            Outbound::Message { message: text.to_string(), sender_id: self.identity.user_id };
        let Some(send) = self.transport.send(&command) else {
            return Ok(vec![]);
        };

        let mut actions = vec![transport_action(send)];
        if self.send_mode == SendMode::Optimistic {
            self.reconciler.push_optimistic(text);
            actions.push(SessionAction::Render);
        }
        Ok(actions)
    }

    fn keystroke(&mut self, now: I) -> Result<Vec<SessionAction>, SessionError> {
        self.require_mounted()?;

        // A deadline that passed unobserved closes the old window first.
        let mut actions = self.tick(now);
        if let Some(command) = self.typing.notify_local_typing(now) {
            actions.extend(self.send(&command));
        }
        Ok(actions)
    }

    fn mark_as_read(&mut self, message_id: u64) -> Result<Vec<SessionAction>, SessionError> {
        self.require_mounted()?;
        Ok(self.send(&Outbound::MarkAsRead { message_id }))
    }

    fn tick(&mut self, now: I) -> Vec<SessionAction> {
        self.typing.tick(now).map(|c| self.send(&c)).unwrap_or_default()
    }

    fn send(&self, command: &Outbound) -> Vec<SessionAction> {
        self.transport.send(command).map(transport_action).into_iter().collect()
    }

    fn require_mounted(&self) -> Result<(), SessionError> {
        if self.mounted.is_none() {
            return Err(SessionError::NotMounted);
        }
        Ok(())
    }
}

fn transport_action(action: TransportAction) -> SessionAction {
    match action {
        TransportAction::Open(request) => SessionAction::Open(request),
        TransportAction::Send(text) => SessionAction::SendFrame(text),
        TransportAction::Close => SessionAction::Close,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Session = ChatSession<Duration>;

    fn session() -> Session {
        ChatSession::new(Identity::new(3, "me"), SessionConfig::default())
    }

    fn frames(actions: &[SessionAction]) -> Vec<&str> {
        actions
            .iter()
            .filter_map(|a| match a {
                SessionAction::SendFrame(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn frame(text: &str) -> SessionEvent<Duration> {
        SessionEvent::FrameReceived(text.to_string())
    }

    fn history_loaded(records: Vec<HistoryRecord>) -> SessionEvent<Duration> {
        SessionEvent::HistoryLoaded { room_id: RoomId::between(3, 7), records }
    }

    fn mounted_open() -> Session {
        let mut session = session();
        session.handle(SessionEvent::Mount { peer_id: 7, auth_token: None }).unwrap();
        session.handle(SessionEvent::Opened).unwrap();
        session
    }

    #[test]
    fn mount_opens_room_socket() {
        let mut session = session();
        let mount = SessionEvent::Mount { peer_id: 7, auth_token: Some("t".into()) };
        let actions = session.handle(mount).unwrap();

        assert_eq!(session.room().map(RoomId::as_str), Some("3_7"));
        let SessionAction::Open(request) = &actions[0] else {
            panic!("expected open, got {actions:?}");
        };
        assert_eq!(request.url, "ws://127.0.0.1:8000/ws/chat/3_7/?user_id=3&token=t");
    }

    #[test]
    fn self_room_rejected() {
        let mut session = session();
        let err = session.handle(SessionEvent::Mount { peer_id: 3, auth_token: None }).unwrap_err();
        assert_eq!(err, SessionError::SelfRoom(3));
    }

    #[test]
    fn remounting_same_peer_is_noop() {
        let mut session = mounted_open();
        let actions = session.handle(SessionEvent::Mount { peer_id: 7, auth_token: None }).unwrap();
        assert!(actions.is_empty());
        assert_eq!(session.connection_state(), TransportState::Open);
    }

    #[test]
    fn switching_peer_resets_first() {
        let mut session = mounted_open();
        session.handle(history_loaded(vec![])).unwrap();
        session.handle(frame(r#"{"id":1,"message":"x","username":"peer7"}"#)).unwrap();
        assert_eq!(session.messages().len(), 1);

        let actions = session.handle(SessionEvent::Mount { peer_id: 9, auth_token: None }).unwrap();
        assert_eq!(actions[0], SessionAction::Close);
        assert!(matches!(actions[1], SessionAction::Open(_)));
        assert!(session.messages().is_empty());
        assert_eq!(session.room().map(RoomId::as_str), Some("3_9"));
    }

    #[test]
    fn opened_requests_history() {
        let mut session = session();
        session.handle(SessionEvent::Mount { peer_id: 7, auth_token: Some("t".into()) }).unwrap();
        let actions = session.handle(SessionEvent::Opened).unwrap();

        assert_eq!(actions[0], SessionAction::FetchHistory {
            room_id: RoomId::between(3, 7),
            auth_token: Some("t".into()),
        });
    }

    #[test]
    fn blank_sends_produce_no_frames() {
        let mut session = mounted_open();
        for text in ["", "   "] {
            let actions = session.handle(SessionEvent::SendMessage { text: text.into() }).unwrap();
            assert!(frames(&actions).is_empty());
            assert!(session.messages().is_empty());
        }
    }

    #[test]
    fn optimistic_send_appends_pending() {
        let mut session = mounted_open();
        let actions = session.handle(SessionEvent::SendMessage { text: " hi ".into() }).unwrap();

        assert_eq!(frames(&actions), vec![r#"{"type":"message","message":"hi","sender_id":3}"#]);
        assert_eq!(session.messages().len(), 1);
        assert!(session.messages()[0].is_pending());
    }

    #[test]
    fn echo_trust_waits_for_broadcast() {
        let config = SessionConfig { send_mode: SendMode::EchoTrust, ..SessionConfig::default() };
        let mut session: Session = ChatSession::new(Identity::new(3, "me"), config);
        session.handle(SessionEvent::Mount { peer_id: 7, auth_token: None }).unwrap();
        session.handle(SessionEvent::Opened).unwrap();

        let actions = session.handle(SessionEvent::SendMessage { text: "hi".into() }).unwrap();
        assert_eq!(frames(&actions).len(), 1);
        assert!(session.messages().is_empty());
    }

    #[test]
    fn send_before_open_is_dropped() {
        let mut session = session();
        session.handle(SessionEvent::Mount { peer_id: 7, auth_token: None }).unwrap();

        let actions = session.handle(SessionEvent::SendMessage { text: "hi".into() }).unwrap();
        assert!(actions.is_empty());
        assert!(session.messages().is_empty());
    }

    #[test]
    fn intents_require_mount() {
        let mut session = session();
        assert_eq!(
            session.handle(SessionEvent::SendMessage { text: "hi".into() }).unwrap_err(),
            SessionError::NotMounted
        );
        assert_eq!(
            session.handle(SessionEvent::Keystroke { now: Duration::ZERO }).unwrap_err(),
            SessionError::NotMounted
        );
    }

    #[test]
    fn own_typing_echo_is_ignored() {
        let mut session = mounted_open();
        session.handle(frame(r#"{"type":"typing","username":"me"}"#)).unwrap();
        session.handle(frame(r#"{"type":"typing","username":"peer7"}"#)).unwrap();

        assert_eq!(session.typing_users(), ["peer7"]);
    }

    #[test]
    fn unmount_with_pending_timer_sends_no_stop() {
        let mut session = mounted_open();
        let actions = session.handle(SessionEvent::Keystroke { now: Duration::ZERO }).unwrap();
        assert_eq!(frames(&actions), vec![r#"{"type":"typing"}"#]);

        let actions = session.handle(SessionEvent::Unmount).unwrap();
        assert_eq!(actions, vec![SessionAction::Close, SessionAction::Render]);

        let actions = session.handle(SessionEvent::Tick { now: Duration::from_secs(10) }).unwrap();
        assert!(actions.is_empty());
        assert!(!session.is_local_typing());
    }

    #[test]
    fn keystroke_after_unobserved_deadline_starts_new_window() {
        let mut session = mounted_open();
        session.handle(SessionEvent::Keystroke { now: Duration::ZERO }).unwrap();

        // No tick between the two keystrokes
        let actions =
            session.handle(SessionEvent::Keystroke { now: Duration::from_millis(3050) }).unwrap();
        assert_eq!(frames(&actions), vec![r#"{"type":"stop_typing"}"#, r#"{"type":"typing"}"#]);
        assert!(session.is_local_typing());

        let actions =
            session.handle(SessionEvent::Keystroke { now: Duration::from_millis(4000) }).unwrap();
        assert!(frames(&actions).is_empty());
    }

    #[test]
    fn remount_same_peer_reconnects_after_close() {
        let mut session = mounted_open();
        let mount = || SessionEvent::Mount { peer_id: 7, auth_token: None };

        session.handle(SessionEvent::Failed { message: "reset".into() }).unwrap();
        assert_eq!(session.connection_state(), TransportState::Closed);

        let actions = session.handle(mount()).unwrap();
        assert!(matches!(actions.first(), Some(SessionAction::Open(_))));
        assert_eq!(session.connection_state(), TransportState::Connecting);
        assert_eq!(session.room().map(RoomId::as_str), Some("3_7"));
    }

    #[test]
    fn stale_history_is_dropped() {
        let mut session = mounted_open();
        session.handle(SessionEvent::Mount { peer_id: 9, auth_token: None }).unwrap();

        let record = HistoryRecord {
            id: 1,
            message: "old room".into(),
            username: Some("peer7".into()),
            sender: None,
            timestamp: None,
            read: false,
        };
        let actions = session.handle(history_loaded(vec![record])).unwrap();

        assert!(actions.is_empty());
        assert!(session.messages().is_empty());
    }

    #[test]
    fn server_error_is_surfaced() {
        let mut session = mounted_open();
        session.handle(frame(r#"{"error":"User not authenticated"}"#)).unwrap();
        assert_eq!(session.server_error(), Some("User not authenticated"));
    }

    #[test]
    fn mark_as_read_sends_and_applies() {
        let mut session = mounted_open();
        session.handle(history_loaded(vec![])).unwrap();
        session.handle(frame(r#"{"id":4,"message":"x","username":"peer7"}"#)).unwrap();

        let actions = session.handle(SessionEvent::MarkAsRead { message_id: 4 }).unwrap();
        assert_eq!(frames(&actions), vec![r#"{"type":"mark_as_read","message_id":4}"#]);

        session.handle(frame(r#"{"type":"mark_as_read","message_id":4}"#)).unwrap();
        assert!(session.messages()[0].read);
    }
}
