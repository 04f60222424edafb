//! Parley session core
//!
//! Pure state machines for one chat room: the socket lifecycle, the merge of
//! stored history with live traffic, and typing state. Nothing here performs
//! I/O. Methods take time and events as inputs and return what the caller
//! should do next.
//!
//! # Components
//!
//! - [`transport`]: connection state machine for the room socket
//! - [`reconciler`]: ordered message sequence built from history and live
//!   messages
//! - [`typing`]: local debounce and remote typing set
//! - [`env`]: time abstraction shared by production and simulation
//! - [`error`]: error types

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod error;
pub mod reconciler;
pub mod transport;
pub mod typing;

pub use env::Environment;
pub use error::TransportError;
pub use reconciler::{AppendOutcome, Message, MessageId, Reconciler};
pub use transport::{
    AuthPlacement, OpenRequest, TransportAction, TransportSession, TransportState,
};
pub use typing::{DEFAULT_TYPING_TIMEOUT, TypingCoordinator};
