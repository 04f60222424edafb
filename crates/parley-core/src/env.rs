//! Environment abstraction for deterministic testing.
//!
//! The session logic never reads a clock. Callers pass instants in, and the
//! instant type comes from the environment: wall-clock time in production,
//! a manually advanced clock in simulation.

use std::time::Duration;

/// Source of monotonic time.
///
/// # Invariants
///
/// - `now()` never goes backwards within one execution context.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The instant type used by this environment.
    ///
    /// Production uses `std::time::Instant`; the simulation harness uses a
    /// virtual instant it advances explicitly.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code calls this. State machines take time as a parameter.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}
