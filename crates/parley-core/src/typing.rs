//! Typing state.
//!
//! Two independent halves:
//!
//! - Local: a debounce over keystrokes. The first keystroke sends `typing`;
//!   later keystrokes only push the deadline back. Once the deadline passes
//!   with no keystroke, `stop_typing` goes out and the timer clears.
//! - Remote: the set of peers currently typing, driven by their
//!   `typing`/`stop_typing` frames. There is no expiry; a lost `stop_typing`
//!   leaves the peer shown as typing until the session resets.
//!
//! The timer is the instant of the last keystroke. Callers drive it with
//! [`TypingCoordinator::tick`].

use std::{ops::Sub, time::Duration};

use parley_proto::Outbound;

/// Idle time after the last keystroke before `stop_typing` is sent.
pub const DEFAULT_TYPING_TIMEOUT: Duration = Duration::from_millis(3000);

/// Local debounce and remote typing set.
#[derive(Debug, Clone)]
pub struct TypingCoordinator<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    timeout: Duration,
    last_keystroke: Option<I>,
    remote: Vec<String>,
}

impl<I> TypingCoordinator<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create a coordinator with the given debounce window.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, last_keystroke: None, remote: Vec::new() }
    }

    /// Whether a debounce timer is pending.
    pub fn is_local_typing(&self) -> bool {
        self.last_keystroke.is_some()
    }

    /// Local keystroke.
    ///
    /// Returns `typing` only when no timer was pending. Otherwise the timer
    /// restarts from `now` and nothing is sent. Call [`Self::tick`] with the
    /// same `now` first so an expired window is closed before a new one opens.
    pub fn notify_local_typing(&mut self, now: I) -> Option<Outbound> {
        let started = self.last_keystroke.is_none();
        self.last_keystroke = Some(now);
        started.then_some(Outbound::Typing)
    }

    /// Fire the timer if its deadline has passed.
    ///
    /// Returns `stop_typing` exactly once per debounce window.
    pub fn tick(&mut self, now: I) -> Option<Outbound> {
        let last = self.last_keystroke?;
        if now < last || now - last < self.timeout {
            return None;
        }

        self.last_keystroke = None;
        Some(Outbound::StopTyping)
    }

    /// Time until the timer fires, if one is pending.
    pub fn remaining(&self, now: I) -> Option<Duration> {
        let last = self.last_keystroke?;
        if now < last {
            return Some(self.timeout);
        }
        Some(self.timeout.saturating_sub(now - last))
    }

    /// Clear the timer without sending anything.
    pub fn cancel(&mut self) {
        self.last_keystroke = None;
    }

    /// A peer started typing.
    ///
    /// The collection is a set: a repeated `typing` from the same peer is a
    /// no-op. Returns true if the set changed.
    pub fn on_remote_typing(&mut self, username: &str) -> bool {
        if self.remote.iter().any(|u| u == username) {
            return false;
        }
        self.remote.push(username.to_string());
        true
    }

    /// A peer stopped typing. Returns true if the set changed.
    pub fn on_remote_stop_typing(&mut self, username: &str) -> bool {
        let before = self.remote.len();
        self.remote.retain(|u| u != username);
        self.remote.len() != before
    }

    /// Peers currently typing, in the order they started.
    pub fn typing_users(&self) -> &[String] {
        &self.remote
    }

    /// Forget all remote typing state.
    pub fn clear_remote(&mut self) {
        self.remote.clear();
    }
}

impl<I> Default for TypingCoordinator<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    fn default() -> Self {
        Self::new(DEFAULT_TYPING_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Duration since an arbitrary epoch is enough of an instant for these tests.
    fn at(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn first_keystroke_sends_typing() {
        let mut typing = TypingCoordinator::default();
        assert_eq!(typing.notify_local_typing(at(0)), Some(Outbound::Typing));
        assert_eq!(typing.notify_local_typing(at(100)), None);
        assert!(typing.is_local_typing());
    }

    #[test]
    fn keystrokes_push_deadline_back() {
        let mut typing = TypingCoordinator::default();
        typing.notify_local_typing(at(0));
        typing.notify_local_typing(at(2000));

        assert_eq!(typing.tick(at(3000)), None);
        assert_eq!(typing.remaining(at(3000)), Some(at(2000)));
        assert_eq!(typing.tick(at(4999)), None);
        assert_eq!(typing.tick(at(5000)), Some(Outbound::StopTyping));
        assert_eq!(typing.tick(at(9000)), None);
        assert!(!typing.is_local_typing());
    }

    #[test]
    fn typing_resent_after_timer_fires() {
        let mut typing = TypingCoordinator::default();
        typing.notify_local_typing(at(0));
        typing.tick(at(3000));
        assert_eq!(typing.notify_local_typing(at(3500)), Some(Outbound::Typing));
    }

    #[test]
    fn cancel_suppresses_stop() {
        let mut typing = TypingCoordinator::default();
        typing.notify_local_typing(at(0));
        typing.cancel();
        assert_eq!(typing.tick(at(10_000)), None);
        assert_eq!(typing.remaining(at(10_000)), None);
    }

    #[test]
    fn remote_set_dedups_and_removes() {
        let mut typing: TypingCoordinator<Duration> = TypingCoordinator::default();
        assert!(typing.on_remote_typing("peer7"));
        assert!(!typing.on_remote_typing("peer7"));
        assert!(typing.on_remote_typing("peer9"));
        assert_eq!(typing.typing_users(), ["peer7", "peer9"]);

        assert!(typing.on_remote_stop_typing("peer7"));
        assert!(!typing.on_remote_stop_typing("peer7"));
        assert_eq!(typing.typing_users(), ["peer9"]);
    }
}
