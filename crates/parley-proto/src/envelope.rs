//! Room socket envelopes.
//!
//! Every text frame on the room WebSocket is a JSON object. Server frames carry
//! a `type` discriminant except chat messages, which the backend broadcasts
//! untagged, and error notices, which carry only an `error` key.
//!
//! Decoding branches explicitly on the discriminant. A frame with no `type` is
//! a chat message unless it carries `error`; anything else with an unrecognized
//! `type` is rejected as [`ProtocolError::UnknownType`] so callers can ignore
//! it without treating it as corruption.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, json};

use crate::{
    errors::{ProtocolError, Result},
    records::{HistoryRecord, LiveMessage},
};

/// Inbound frame from the room socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// A chat message. Sent untagged or with `type: "message"`.
    Message(LiveMessage),

    /// A participant started typing.
    Typing {
        /// Who is typing.
        username: String,
    },

    /// A participant stopped typing.
    StopTyping {
        /// Who stopped.
        username: String,
    },

    /// Stored messages, sent once after the socket opens.
    PreviousMessages {
        /// Oldest first.
        messages: Vec<HistoryRecord>,
    },

    /// A message was marked read by its recipient.
    MarkAsRead {
        /// Server id of the message.
        message_id: u64,
    },

    /// Server rejected the last command.
    Error {
        /// Server's message, e.g. `"User not authenticated"`.
        error: String,
    },
}

#[derive(Deserialize)]
struct UsernameBody {
    username: String,
}

#[derive(Deserialize)]
struct PreviousMessagesBody {
    messages: Vec<HistoryRecord>,
}

#[derive(Deserialize)]
struct MarkAsReadBody {
    message_id: u64,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl Envelope {
    /// Decode a text frame.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::MalformedFrame`] if the text is not JSON
    /// - [`ProtocolError::NotAnObject`] if the JSON is not an object
    /// - [`ProtocolError::InvalidDiscriminant`] if `type` is not a string
    /// - [`ProtocolError::UnknownType`] for discriminants this client ignores
    /// - [`ProtocolError::InvalidFields`] if a known variant is missing fields
    pub fn decode(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ProtocolError::MalformedFrame(e.to_string()))?;

        let Value::Object(object) = value else {
            return Err(ProtocolError::NotAnObject);
        };

        let discriminant = match object.get("type") {
            None => None,
            Some(Value::String(tag)) => Some(tag.clone()),
            Some(other) => return Err(ProtocolError::InvalidDiscriminant(other.to_string())),
        };

        match discriminant.as_deref() {
            None if object.contains_key("error") => {
                let body: ErrorBody = fields(object, "error")?;
                Ok(Self::Error { error: body.error })
            },
            None | Some("message") => Ok(Self::Message(fields(object, "message")?)),
            Some("typing") => {
                let body: UsernameBody = fields(object, "typing")?;
                Ok(Self::Typing { username: body.username })
            },
            Some("stop_typing") => {
                let body: UsernameBody = fields(object, "stop_typing")?;
                Ok(Self::StopTyping { username: body.username })
            },
            Some("previous_messages") => {
                let body: PreviousMessagesBody = fields(object, "previous_messages")?;
                Ok(Self::PreviousMessages { messages: body.messages })
            },
            Some("mark_as_read") => {
                let body: MarkAsReadBody = fields(object, "mark_as_read")?;
                Ok(Self::MarkAsRead { message_id: body.message_id })
            },
            Some(other) => Err(ProtocolError::UnknownType(other.to_string())),
        }
    }

    /// Encode as the server would send it.
    ///
    /// Chat messages are emitted untagged, matching the backend broadcast.
    /// Used by relays and tests; the client never sends envelopes.
    pub fn encode(&self) -> String {
        let value = match self {
            Self::Message(message) => json!({
                "id": message.id,
                "message": message.message,
                "username": message.username,
                "timestamp": message.timestamp,
                "read": message.read,
            }),
            Self::Typing { username } => json!({ "type": "typing", "username": username }),
            Self::StopTyping { username } => json!({ "type": "stop_typing", "username": username }),
            Self::PreviousMessages { messages } => {
                json!({ "type": "previous_messages", "messages": messages })
            },
            Self::MarkAsRead { message_id } => {
                json!({ "type": "mark_as_read", "message_id": message_id })
            },
            Self::Error { error } => json!({ "error": error }),
        };
        value.to_string()
    }
}

fn fields<T: DeserializeOwned>(object: Map<String, Value>, variant: &'static str) -> Result<T> {
    serde_json::from_value(Value::Object(object))
        .map_err(|e| ProtocolError::InvalidFields { variant, reason: e.to_string() })
}

/// Command sent by the client on the room socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    /// Post a chat message.
    Message {
        /// Message text.
        message: String,
        /// Local user's id.
        sender_id: u64,
    },
    /// Local user started typing.
    Typing,
    /// Local user stopped typing.
    StopTyping,
    /// Mark a received message as read.
    MarkAsRead {
        /// Server id of the message.
        message_id: u64,
    },
}

impl Outbound {
    /// Serialize to a text frame.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Encode`] if serialization fails.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_frame_is_a_message() {
        let envelope = Envelope::decode(
            r#"{"message":"hello","username":"peer7","timestamp":"2024-01-01 10:00:00","id":42}"#,
        )
        .unwrap();

        let Envelope::Message(message) = envelope else {
            panic!("expected message, got {envelope:?}");
        };
        assert_eq!(message.id, 42);
        assert_eq!(message.username, "peer7");
        assert!(!message.read);
    }

    #[test]
    fn error_frame_is_not_a_message() {
        let envelope = Envelope::decode(r#"{"error":"User not authenticated"}"#).unwrap();
        assert_eq!(envelope, Envelope::Error { error: "User not authenticated".into() });
    }

    #[test]
    fn typing_frames_decode() {
        assert_eq!(
            Envelope::decode(r#"{"type":"typing","username":"peer7"}"#).unwrap(),
            Envelope::Typing { username: "peer7".into() }
        );
        assert_eq!(
            Envelope::decode(r#"{"type":"stop_typing","username":"peer7"}"#).unwrap(),
            Envelope::StopTyping { username: "peer7".into() }
        );
    }

    #[test]
    fn previous_messages_decode_in_order() {
        let envelope = Envelope::decode(
            r#"{"type":"previous_messages","messages":[
                {"id":1,"username":"me","message":"a","timestamp":"t1","read":true},
                {"id":2,"username":"peer7","message":"b","timestamp":"t2","read":false}
            ]}"#,
        )
        .unwrap();

        let Envelope::PreviousMessages { messages } = envelope else {
            panic!("expected previous_messages");
        };
        let ids: Vec<u64> = messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(messages[0].read);
    }

    #[test]
    fn unknown_type_is_flagged() {
        let err = Envelope::decode(r#"{"type":"presence","online":true}"#).unwrap_err();
        assert!(err.is_unknown_type());
    }

    #[test]
    fn rejects_bad_frames() {
        assert!(matches!(Envelope::decode("not json"), Err(ProtocolError::MalformedFrame(_))));
        assert_eq!(Envelope::decode("[1,2]"), Err(ProtocolError::NotAnObject));
        assert!(matches!(
            Envelope::decode(r#"{"type":7}"#),
            Err(ProtocolError::InvalidDiscriminant(_))
        ));
        assert!(matches!(
            Envelope::decode(r#"{"type":"typing"}"#),
            Err(ProtocolError::InvalidFields { variant: "typing", .. })
        ));
        assert!(matches!(
            Envelope::decode(r#"{"message":"no id","username":"x"}"#),
            Err(ProtocolError::InvalidFields { variant: "message", .. })
        ));
    }

    #[test]
    fn encode_decodes_back() {
        let envelopes = [
            Envelope::Message(LiveMessage {
                id: 9,
                message: "hey".into(),
                username: "me".into(),
                timestamp: Some("t".into()),
                read: false,
            }),
            Envelope::Typing { username: "me".into() },
            Envelope::MarkAsRead { message_id: 9 },
            Envelope::Error { error: "nope".into() },
        ];

        for envelope in envelopes {
            assert_eq!(Envelope::decode(&envelope.encode()).unwrap(), envelope);
        }
    }

    #[test]
    fn outbound_is_internally_tagged() {
        assert_eq!(Outbound::Typing.encode().unwrap(), r#"{"type":"typing"}"#);
        assert_eq!(Outbound::StopTyping.encode().unwrap(), r#"{"type":"stop_typing"}"#);
    }
}
