//! Room name derivation.
//!
//! A room is the channel between exactly two users. Its name is the two user
//! ids in ascending numeric order joined by `_`, so both participants compute
//! the same name regardless of who opens the conversation.
//!
//! # Invariants
//!
//! - Commutative: `RoomId::between(a, b) == RoomId::between(b, a)`.
//! - Stable: the same unordered pair always yields the same name.
//! - Parsing a derived name returns the ordered pair it was built from.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::ProtocolError;

/// Name of a two-party room, e.g. `"3_7"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Derive the room shared by two users.
    pub fn between(a: u64, b: u64) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{low}_{high}"))
    }

    /// Room name as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Participants in ascending order.
    ///
    /// Always succeeds for names produced by [`RoomId::between`] or
    /// [`str::parse`].
    pub fn participants(&self) -> Option<(u64, u64)> {
        let (low, high) = self.0.split_once('_')?;
        Some((low.parse().ok()?, high.parse().ok()?))
    }

    /// Check whether `user_id` is one of the two participants.
    pub fn includes(&self, user_id: u64) -> bool {
        self.participants().is_some_and(|(low, high)| low == user_id || high == user_id)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomId {
    type Err = ProtocolError;

    /// Parse a room name received from elsewhere (URL, REST record).
    ///
    /// Accepts only the canonical form: two distinct numeric ids, low first.
    /// A name in the wrong order would address a room nobody else derives,
    /// and nobody chats with themselves.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProtocolError::InvalidRoomName(s.to_string());

        let (low, high) = s.split_once('_').ok_or_else(invalid)?;
        let low: u64 = low.parse().map_err(|_| invalid())?;
        let high: u64 = high.parse().map_err(|_| invalid())?;

        if low >= high {
            return Err(invalid());
        }

        Ok(Self::between(low, high))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_numerically_not_lexically() {
        assert_eq!(RoomId::between(10, 9).as_str(), "9_10");
        assert_eq!(RoomId::between(3, 7).as_str(), "3_7");
    }

    #[test]
    fn parse_round_trips_participants() {
        let room: RoomId = "3_7".parse().unwrap();
        assert_eq!(room.participants(), Some((3, 7)));
        assert!(room.includes(3));
        assert!(room.includes(7));
        assert!(!room.includes(5));
    }

    #[test]
    fn parse_rejects_non_canonical_names() {
        assert!("7_3".parse::<RoomId>().is_err());
        assert!("3_3".parse::<RoomId>().is_err());
        assert!("3-7".parse::<RoomId>().is_err());
        assert!("a_7".parse::<RoomId>().is_err());
        assert!("3_7_9".parse::<RoomId>().is_err());
        assert!("".parse::<RoomId>().is_err());
    }

    #[test]
    fn serializes_as_bare_string() {
        let json = serde_json::to_string(&RoomId::between(7, 3)).unwrap();
        assert_eq!(json, "\"3_7\"");
    }
}
