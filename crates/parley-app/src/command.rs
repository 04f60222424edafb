//! Slash command parsing.
//!
//! A line starting with `/` is a command; anything else is a chat message.
//! `//` escapes a message that starts with a slash.

use thiserror::Error;

/// Parsed composer line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain chat message.
    Message {
        /// Message text.
        text: String,
    },
    /// `/peer <user_id>`: open the room with that user.
    Peer {
        /// The other participant.
        peer_id: u64,
    },
    /// `/read <message_id>`: mark a message as read.
    Read {
        /// Server id of the message.
        message_id: u64,
    },
    /// `/leave`: close the open room.
    Leave,
    /// `/quit`
    Quit,
}

/// Command parse errors, shown on the status line.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    /// Unrecognized command name.
    #[error("unknown command /{0}")]
    Unknown(String),

    /// Command needs an argument.
    #[error("usage: /{command} <{argument}>")]
    MissingArgument {
        /// Command name
        command: &'static str,
        /// Argument name
        argument: &'static str,
    },

    /// Argument is not a valid id.
    #[error("/{command}: {value:?} is not a valid id")]
    InvalidId {
        /// Command name
        command: &'static str,
        /// Argument as typed
        value: String,
    },
}

/// Parse a composer line.
///
/// # Errors
///
/// Returns a [`CommandError`] for unknown commands or bad arguments.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return Ok(Command::Message { text: line.to_string() });
    };

    if rest.starts_with('/') {
        return Ok(Command::Message { text: rest.to_string() });
    }

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let argument = parts.next();

    match name {
        "peer" | "p" => Ok(Command::Peer { peer_id: parse_id("peer", "user_id", argument)? }),
        "read" => Ok(Command::Read { message_id: parse_id("read", "message_id", argument)? }),
        "leave" => Ok(Command::Leave),
        "quit" | "q" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn parse_id(
    command: &'static str,
    argument: &'static str,
    value: Option<&str>,
) -> Result<u64, CommandError> {
    let value = value.ok_or(CommandError::MissingArgument { command, argument })?;
    value.parse().map_err(|_| CommandError::InvalidId { command, value: value.to_string() })
}
