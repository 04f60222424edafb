//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while decoding or encoding wire data.
///
/// None of these are fatal to a session. Callers log and drop the offending
/// frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame is not valid JSON.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Frame is valid JSON but not an object.
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// `type` field is present but not a string.
    #[error("invalid discriminant: expected string, got {0}")]
    InvalidDiscriminant(String),

    /// `type` field names a variant this client does not understand.
    #[error("unknown envelope type: {0}")]
    UnknownType(String),

    /// Variant was recognized but its fields do not match.
    #[error("invalid {variant} envelope: {reason}")]
    InvalidFields {
        /// Envelope variant being decoded.
        variant: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// Serialization of an outbound value failed.
    #[error("encode failed: {0}")]
    Encode(String),

    /// Room name is not `{low}_{high}` over two distinct numeric ids.
    #[error("invalid room name: {0:?}")]
    InvalidRoomName(String),

    /// Endpoint base URL cannot be used.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl ProtocolError {
    /// Returns true for frames that are well-formed but carry a discriminant
    /// this client ignores.
    ///
    /// Unknown types are expected when the server is newer than the client
    /// and are logged at a lower level than genuine decode failures.
    pub fn is_unknown_type(&self) -> bool {
        matches!(self, Self::UnknownType(_))
    }
}
