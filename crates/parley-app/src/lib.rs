//! Application layer for Parley
//!
//! Pure state machines and a generic runtime for chat frontends, so the same
//! orchestration code runs in the terminal client and in simulation.
//!
//! # Components
//!
//! - [`App`]: UI state machine (composer, slash commands, status line)
//! - [`Driver`]: Trait for platform-specific I/O
//! - [`Runtime`]: Generic loop wiring the App and a
//!   [`ChatSession`](parley_client::ChatSession) to a Driver
//! - [`ChatView`]: Read-only snapshot handed to the renderer

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod command;
mod composer;
mod driver;
mod event;
mod input;
mod runtime;
mod signal;
mod view;

pub use action::AppAction;
pub use app::App;
pub use command::{Command, CommandError, parse as parse_command};
pub use composer::Composer;
pub use driver::Driver;
pub use event::AppEvent;
pub use input::KeyInput;
pub use runtime::Runtime;
pub use signal::DriverSignal;
pub use view::ChatView;
