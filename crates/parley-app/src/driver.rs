//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements it, while the generic
//! [`crate::Runtime`] handles all orchestration.

use std::{future::Future, ops::Sub, time::Duration};

use parley_client::OpenRequest;
use parley_proto::RoomId;

use crate::{AppEvent, ChatView, DriverSignal};

/// Abstracts I/O operations for the application runtime.
///
/// Socket and history operations are fire-and-forget: their outcome comes
/// back later through [`Driver::recv_signal`]. A driver never reports a
/// connection failure as an error; it queues [`DriverSignal::Failed`].
///
/// # Implementations
///
/// - **TUI**: crossterm for terminal events, tokio-tungstenite for the
///   socket, reqwest for history
/// - **Simulation**: in-memory queues and an emulated relay
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in simulation.
    type Instant: Copy + Ord + Send + Sync + Sub<Output = Duration>;

    /// Poll for the next input event.
    ///
    /// Returns `None` if no input is ready. May wait briefly for input, but
    /// must return early once a signal is queued.
    fn poll_event(&mut self) -> impl Future<Output = Result<Option<AppEvent>, Self::Error>> + Send;

    /// Start opening a socket. Reports `Opened` or `Failed` later.
    fn open(&mut self, request: &OpenRequest);

    /// Send a text frame on the open socket.
    ///
    /// # Errors
    ///
    /// Returns an error only for unrecoverable driver faults. A socket that
    /// went away is reported as a signal instead.
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Close the socket. No further signals are reported for it.
    fn close(&mut self);

    /// Start fetching stored messages for a room.
    fn fetch_history(&mut self, room_id: RoomId, auth_token: Option<String>);

    /// Next queued completion, without waiting.
    fn recv_signal(&mut self) -> Option<DriverSignal>;

    /// Render the current state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, view: &ChatView<'_, Self::Instant>) -> Result<(), Self::Error>;

    /// Stop all I/O and clean up resources.
    fn stop(&mut self);
}
