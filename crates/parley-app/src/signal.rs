//! Completions reported by the driver.

use parley_client::SessionEvent;
use parley_proto::{HistoryRecord, RoomId};

/// I/O results the driver reports back to the runtime.
///
/// Socket events and history fetches complete asynchronously; the driver
/// queues them and the runtime drains the queue every cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverSignal {
    /// Socket finished opening.
    Opened,
    /// Text frame from the server.
    Text(String),
    /// Socket closed.
    Closed {
        /// Close reason, if any.
        reason: Option<String>,
    },
    /// Socket failed to open or broke.
    Failed {
        /// Description of the failure.
        message: String,
    },
    /// History fetch succeeded.
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
}

impl DriverSignal {
    /// The session event this signal reports.
    pub fn into_session_event<I>(self) -> SessionEvent<I> {
        match self {
            Self::Opened => SessionEvent::Opened,
            Self::Text(text) => SessionEvent::FrameReceived(text),
            Self::Closed { reason } => SessionEvent::Closed { reason },
            Self::Failed { message } => SessionEvent::Failed { message },
            Self::HistoryLoaded { room_id, records } => {
                SessionEvent::HistoryLoaded { room_id, records }
            },
            Self::HistoryFailed { room_id, reason } => {
                SessionEvent::HistoryFailed { room_id, reason }
            },
        }
    }
}
