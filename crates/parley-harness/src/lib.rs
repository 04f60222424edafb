//! Deterministic simulation harness for Parley.
//!
//! In-memory implementations of the Environment and Driver traits plus an
//! emulated chat backend, so the production [`parley_app::Runtime`] can be
//! driven through whole conversations without a terminal or network.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks behavioral properties against snapshots of
//! each client's observable state. Use [`InvariantRegistry::standard()`] for
//! the session invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_relay;
pub mod world;

pub use invariants::{
    ClientSnapshot, Invariant, InvariantRegistry, InvariantResult, MessageSnapshot,
    NoRoomStateWhenUnmounted, PendingOnlyFromLocalUser, RoomIdCanonical, ServerIdsUnique,
    SystemSnapshot, TypingExcludesLocalUser, TypingUsersUnique, Violation,
};
pub use sim_driver::{RenderedView, SimDriver, SimDriverError};
pub use sim_env::{SimEnv, SimInstant};
pub use sim_relay::{ConnId, RelayError, SimRelay};
pub use world::{SimClient, SimWorld};
