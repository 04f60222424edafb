//! Error types for the session core.
//!
//! Only caller misuse is an error here. Bad frames from the server are logged
//! and dropped by the state machines and never surface as `Err`.

use thiserror::Error;

use crate::transport::TransportState;

/// Errors from the transport state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Operation is not valid in the current state
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// Current state when error occurred
        state: TransportState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Socket URL could not be built
    #[error("endpoint error: {0}")]
    Endpoint(String),
}

/// Convert parley-proto errors to `TransportError`
impl From<parley_proto::ProtocolError> for TransportError {
    fn from(err: parley_proto::ProtocolError) -> Self {
        Self::Endpoint(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_names_operation() {
        let err =
            TransportError::InvalidState { state: TransportState::Open, operation: "connect" };
        assert_eq!(err.to_string(), "invalid state transition: cannot connect from Open");
    }
}
