//! Terminal UI for Parley
//!
//! A thin shell over [`parley_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`parley_app::Runtime`].
//!
//! This crate handles terminal input and rendering, the room socket and the
//! REST calls around it, and process setup (arguments, logging).

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cli;
mod error;
pub mod logging;
pub mod system_env;
pub mod terminal;
pub mod ui;

pub use error::TuiError;
pub use parley_app::{App, AppAction, AppEvent, ChatView, Driver, KeyInput, Runtime};
pub use system_env::SystemEnv;
pub use terminal::{TerminalDriver, TerminalError};
