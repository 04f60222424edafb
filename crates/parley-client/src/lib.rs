//! Client
//!
//! Chat session controller for one two-party room. Composes the transport,
//! reconciler and typing state machines from [`parley_core`] and drives them
//! from UI lifecycle events.
//!
//! # Architecture
//!
//! [`ChatSession`] follows the same Sans-IO, action-based pattern as the core.
//! It receives [`SessionEvent`]s (mount, socket events, history results, user
//! intents, ticks), updates its state, and returns [`SessionAction`]s for the
//! caller to execute. Identity is passed in explicitly at construction.
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::open_socket`]: WebSocket task bridged to channels
//! - [`api::ApiClient`]: REST client for login, users and history

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod error;
mod event;
mod session;

#[cfg(feature = "transport")]
pub mod api;
#[cfg(feature = "transport")]
pub mod transport;

pub use config::{DEFAULT_WS_BASE, SendMode, SessionConfig};
pub use error::SessionError;
pub use event::{SessionAction, SessionEvent};
pub use parley_core::{
    AuthPlacement, Environment, Message, MessageId, OpenRequest, TransportState,
};
pub use parley_proto::{HistoryRecord, RoomId, UserRecord};
pub use session::{ChatSession, Identity};
