//! Message reconciliation.
//!
//! Builds one ordered view of a room from two sources: the history fetched
//! over REST once the socket opens, and messages streamed live on the socket.
//!
//! Ordering is by arrival into the sequence, never by timestamp. History
//! replaces the sequence wholesale; live messages append.
//!
//! # History race
//!
//! The history fetch completes asynchronously and can lose the race against a
//! fast live message. Until history is applied, live messages are queued and
//! appended after it in arrival order. Queued messages whose id already
//! appears in the history are dropped. If the fetch fails the queue is flushed
//! as-is.
//!
//! # Optimistic messages
//!
//! With optimistic sends the local user's message is shown immediately under a
//! [`MessageId::Local`] id. When the server echoes it back, the oldest pending
//! local message with the same content takes the server id in place instead of
//! appearing twice.

use parley_proto::{HistoryRecord, LiveMessage};

/// Identity of a message in the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageId {
    /// Assigned by the server. Immutable once set.
    Server(u64),
    /// Temporary id of an optimistic message awaiting its echo.
    Local(u64),
}

/// A message in the reconciled sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message identity
    pub id: MessageId,
    /// Who sent it
    pub sender_username: String,
    /// Message text
    pub content: String,
    /// Server timestamp, verbatim
    pub timestamp: Option<String>,
    /// Whether the recipient has read it
    pub read: bool,
}

impl Message {
    /// Whether `username` sent this message.
    ///
    /// Derived at render time; the sequence never stores it.
    pub fn is_from(&self, username: &str) -> bool {
        self.sender_username == username
    }

    /// Whether this is an optimistic message not yet echoed by the server.
    pub fn is_pending(&self) -> bool {
        matches!(self.id, MessageId::Local(_))
    }

    fn from_history(record: HistoryRecord) -> Self {
        let sender_username = record.sender_username().to_string();
        Self {
            id: MessageId::Server(record.id),
            sender_username,
            content: record.message,
            timestamp: record.timestamp,
            read: record.read,
        }
    }

    fn from_live(message: LiveMessage) -> Self {
        Self {
            id: MessageId::Server(message.id),
            sender_username: message.username,
            content: message.message,
            timestamp: message.timestamp,
            read: message.read,
        }
    }
}

/// What happened to a live message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Appended to the end of the sequence
    Appended,
    /// Held until history is applied
    Queued,
    /// Replaced a pending optimistic message in place
    Confirmed,
    /// Server id already shown; a pending copy of it was dropped
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingHistory,
    Live,
}

/// Ordered, append-only message sequence for one room.
#[derive(Debug, Clone)]
pub struct Reconciler {
    local_username: String,
    phase: Phase,
    messages: Vec<Message>,
    queued: Vec<LiveMessage>,
    next_local_id: u64,
}

impl Reconciler {
    /// Create an empty reconciler waiting for history.
    pub fn new(local_username: impl Into<String>) -> Self {
        Self {
            local_username: local_username.into(),
            phase: Phase::AwaitingHistory,
            messages: Vec::new(),
            queued: Vec::new(),
            next_local_id: 1,
        }
    }

    /// Read-only ordered view.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether history has been applied (or abandoned).
    pub fn is_live(&self) -> bool {
        self.phase == Phase::Live
    }

    /// Number of live messages held back until history lands.
    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    /// Replace the sequence with history, then apply queued live messages.
    ///
    /// Optimistic messages still awaiting their echo are kept after the
    /// history. A pending message whose echo was queued is confirmed against
    /// the history copy if present.
    pub fn load_history(&mut self, records: Vec<HistoryRecord>) {
        let pending: Vec<Message> = self.messages.drain(..).filter(Message::is_pending).collect();

        self.messages = records.into_iter().map(Message::from_history).collect();
        self.messages.extend(pending);
        self.phase = Phase::Live;

        tracing::debug!(
            history = self.messages.len(),
            queued = self.queued.len(),
            "history applied"
        );

        for message in std::mem::take(&mut self.queued) {
            self.apply_live(message);
        }
    }

    /// History could not be fetched. Flush the queue and go live.
    pub fn abandon_history(&mut self) {
        self.phase = Phase::Live;
        for message in std::mem::take(&mut self.queued) {
            self.apply_live(message);
        }
    }

    /// Take a live chat message.
    pub fn append_live(&mut self, message: LiveMessage) -> AppendOutcome {
        match self.phase {
            Phase::AwaitingHistory => {
                self.queued.push(message);
                AppendOutcome::Queued
            },
            Phase::Live => self.apply_live(message),
        }
    }

    /// Show a local message before the server confirms it.
    ///
    /// Returns the temporary id.
    pub fn push_optimistic(&mut self, content: impl Into<String>) -> MessageId {
        let id = MessageId::Local(self.next_local_id);
        self.next_local_id += 1;

        self.messages.push(Message {
            id,
            sender_username: self.local_username.clone(),
            content: content.into(),
            timestamp: None,
            read: false,
        });
        id
    }

    /// Mark a server message as read.
    ///
    /// Returns true if the flag changed.
    pub fn mark_read(&mut self, message_id: u64) -> bool {
        let target = MessageId::Server(message_id);
        match self.messages.iter_mut().find(|m| m.id == target) {
            Some(message) if !message.read => {
                message.read = true;
                true
            },
            _ => false,
        }
    }

    /// Clear everything and wait for history again.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.queued.clear();
        self.phase = Phase::AwaitingHistory;
    }

    fn apply_live(&mut self, message: LiveMessage) -> AppendOutcome {
        if self.contains_server_id(message.id) {
            self.drop_pending_echo(&message);
            return AppendOutcome::Duplicate;
        }

        if message.username == self.local_username
            && let Some(pending) =
                self.messages.iter_mut().find(|m| m.is_pending() && m.content == message.message)
        {
            pending.id = MessageId::Server(message.id);
            pending.timestamp = message.timestamp;
            pending.read = message.read;
            return AppendOutcome::Confirmed;
        }

        self.messages.push(Message::from_live(message));
        AppendOutcome::Appended
    }

    fn contains_server_id(&self, id: u64) -> bool {
        self.messages.iter().any(|m| m.id == MessageId::Server(id))
    }

    /// History already holds the server copy of a queued echo; the optimistic
    /// copy is now redundant.
    fn drop_pending_echo(&mut self, message: &LiveMessage) {
        if message.username != self.local_username {
            return;
        }
        if let Some(index) =
            self.messages.iter().position(|m| m.is_pending() && m.content == message.message)
        {
            self.messages.remove(index);
        }
    }
}
