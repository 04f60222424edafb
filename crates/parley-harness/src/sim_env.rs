//! Virtual clock environment.
//!
//! Time only moves when a test advances it. Every clone shares the same
//! clock, so all clients in a world observe one timeline.

use std::{
    future::Future,
    ops::Sub,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use parley_core::Environment;

/// Instant on the virtual clock, in milliseconds since the world started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimInstant(u64);

impl SimInstant {
    /// Milliseconds since the start of the simulation.
    pub fn as_millis(self) -> u64 {
        self.0
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    /// Saturates at zero, like `std::time::Instant`.
    fn sub(self, rhs: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(rhs.0))
    }
}

/// Environment backed by a shared virtual clock.
#[derive(Debug, Clone, Default)]
pub struct SimEnv {
    millis: Arc<AtomicU64>,
}

impl SimEnv {
    /// Clock starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: Duration) {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        SimInstant(self.millis.load(Ordering::SeqCst))
    }

    /// Sleeping advances the virtual clock and returns at once.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }
}
