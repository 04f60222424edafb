//! Application input events.
//!
//! [`AppEvent`] covers what the user and the terminal do. Socket and history
//! results arrive separately as [`DriverSignal`](crate::DriverSignal)s and go
//! straight to the session.

use crate::KeyInput;

/// Events processed by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Keyboard input.
    Key(KeyInput),

    /// Terminal resize (columns, rows).
    Resize(u16, u16),

    /// Periodic tick with no input.
    Tick,
}
