//! Top-level client errors.

use std::io;

use parley_client::api::ApiError;
use thiserror::Error;

use crate::TerminalError;

/// Errors that end the client process.
#[derive(Debug, Error)]
pub enum TuiError {
    /// I/O error outside the terminal (log file, stdout).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// REST call failed.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Terminal driver failed.
    #[error(transparent)]
    Terminal(#[from] TerminalError),

    /// Logging could not be set up.
    #[error("logging setup failed: {0}")]
    Logging(String),
}
