//! Parley wire protocol
//!
//! Types shared by every layer that touches the network: the JSON envelopes
//! exchanged over the room WebSocket, the records returned by the REST API,
//! room name derivation, and endpoint construction.
//!
//! # Envelopes
//!
//! Inbound text frames decode into [`Envelope`], a sum type with one variant
//! per server message shape. The server tags most frames with a `type` field
//! but sends chat messages untagged; [`Envelope::decode`] resolves that with an
//! explicit branch per discriminant instead of field-presence sniffing.
//! Outbound commands are [`Outbound`], serialized as internally tagged JSON.
//!
//! # Rooms
//!
//! A room pairs exactly two users. [`RoomId::between`] derives the same name
//! regardless of which participant computes it.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod endpoint;
pub mod envelope;
pub mod errors;
pub mod records;
pub mod room;

pub use endpoint::room_endpoint;
pub use envelope::{Envelope, Outbound};
pub use errors::{ProtocolError, Result};
pub use records::{HistoryRecord, LiveMessage, LoginResponse, UserRecord};
pub use room::RoomId;
