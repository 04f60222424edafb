//! Session controller errors.

use parley_core::TransportError;
use thiserror::Error;

/// Errors from [`ChatSession`](crate::ChatSession).
///
/// These are caller mistakes. Network and protocol faults never surface here;
/// they show up as connection state and log lines.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// An intent arrived while no room is mounted
    #[error("no room mounted")]
    NotMounted,

    /// Peer is the local user
    #[error("cannot open a room with yourself (user {0})")]
    SelfRoom(u64),

    /// Transport rejected the request
    #[error(transparent)]
    Transport(#[from] TransportError),
}
