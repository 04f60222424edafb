//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties that must always hold during system execution.
//! Unlike example-based tests that check specific scenarios, invariants
//! verify behavioral properties across all possible execution paths.
//!
//! # Architecture
//!
//! The sim driver captures each client's observable state into a
//! [`ClientSnapshot`] on every render. Registered [`Invariant`] checks run
//! against a [`SystemSnapshot`] of all clients. Violations trigger panics
//! with detailed context for debugging.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! registry.assert_all(&world.snapshot(), "after step 12");
//! ```

mod checks;
mod snapshot;

pub use checks::{
    NoRoomStateWhenUnmounted, PendingOnlyFromLocalUser, RoomIdCanonical, ServerIdsUnique,
    TypingExcludesLocalUser, TypingUsersUnique,
};
pub use snapshot::{ClientSnapshot, MessageSnapshot, SystemSnapshot};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// An invariant that can be checked against system state.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against the current state.
    ///
    /// Returns `Ok(())` if the invariant holds, or a [`Violation`]
    /// describing what went wrong.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;

    /// Build a violation for this invariant.
    fn violation(&self, message: String) -> Violation {
        Violation { invariant: self.name(), message }
    }
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with the standard session invariants.
    ///
    /// Includes:
    /// - [`TypingExcludesLocalUser`]: nobody sees themselves typing
    /// - [`TypingUsersUnique`]: each typer is listed once
    /// - [`PendingOnlyFromLocalUser`]: optimistic messages are our own
    /// - [`ServerIdsUnique`]: no server message is shown twice
    /// - [`NoRoomStateWhenUnmounted`]: leaving a room clears it
    /// - [`RoomIdCanonical`]: the room name matches the two participants
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(TypingExcludesLocalUser);
        registry.add(TypingUsersUnique);
        registry.add(PendingOnlyFromLocalUser);
        registry.add(ServerIdsUnique);
        registry.add(NoRoomStateWhenUnmounted);
        registry.add(RoomIdCanonical);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the given state.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    ///
    /// # Errors
    ///
    /// Returns every violation found.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking on the first failure.
    ///
    /// # Panics
    ///
    /// Panics with every violation and `context` if any invariant fails.
    #[allow(clippy::panic, reason = "Test assertion helper")]
    pub fn assert_all(&self, state: &SystemSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
