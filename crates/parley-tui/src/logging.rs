//! Log setup.
//!
//! The terminal belongs to the UI, so logs go to a file. `RUST_LOG`
//! overrides the level given on the command line.

use std::{fs::OpenOptions, path::Path, sync::Mutex};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::TuiError;

/// Install a global subscriber writing to `path` (appending).
///
/// # Errors
///
/// - `TuiError::Io` if the file cannot be opened
/// - `TuiError::Logging` if a subscriber is already installed
pub fn init(path: &Path, level: &str) -> Result<(), TuiError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(filter)
        .try_init()
        .map_err(|e| TuiError::Logging(e.to_string()))
}
