//! Application state machine.
//!
//! [`App`] owns what the user sees and edits outside the chat itself: the
//! composer line and a transient status message. It
//! consumes [`AppEvent`]s and produces [`AppAction`]s; room state lives in
//! the session the runtime drives alongside it.

use crate::{
    AppAction, AppEvent, KeyInput,
    command::{self, Command},
    composer::Composer,
};

/// Application state machine.
///
/// Pure state machine with no I/O, fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    composer: Composer,
    /// Transient status message. `None` if no message.
    status_message: Option<String>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Create an App with an empty composer.
    pub fn new() -> Self {
        Self { composer: Composer::new(), status_message: None }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Resize(..) => vec![AppAction::Render],
            AppEvent::Tick => vec![],
        }
    }

    fn handle_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        match key {
            KeyInput::Char(c) => {
                self.composer.insert(c);
                self.edited(true)
            },
            KeyInput::Backspace => {
                let changed = self.composer.backspace();
                self.edited(changed)
            },
            KeyInput::Delete => {
                let changed = self.composer.delete();
                self.edited(changed)
            },
            KeyInput::Left => {
                self.composer.left();
                vec![AppAction::Render]
            },
            KeyInput::Right => {
                self.composer.right();
                vec![AppAction::Render]
            },
            KeyInput::Home => {
                self.composer.home();
                vec![AppAction::Render]
            },
            KeyInput::End => {
                self.composer.end();
                vec![AppAction::Render]
            },
            KeyInput::Enter => self.submit(),
            KeyInput::Esc => vec![AppAction::Quit],
        }
    }

    /// Actions after an edit. Command lines are not chat input, so they
    /// never count as typing.
    fn edited(&self, changed: bool) -> Vec<AppAction> {
        if !changed {
            vec![]
        } else if self.composer.text().starts_with('/') {
            vec![AppAction::Render]
        } else {
            vec![AppAction::Keystroke, AppAction::Render]
        }
    }

    /// Take the composer line and turn it into an intent.
    fn submit(&mut self) -> Vec<AppAction> {
        let line = self.composer.take();

        match command::parse(&line) {
            Ok(Command::Message { text }) => vec![AppAction::SendMessage { text }, AppAction::Render],
            Ok(Command::Peer { peer_id }) => {
                self.status_message = Some(format!("Opening chat with user {peer_id}"));
                vec![AppAction::SwitchPeer { peer_id }, AppAction::Render]
            },
            Ok(Command::Read { message_id }) => {
                vec![AppAction::MarkRead { message_id }, AppAction::Render]
            },
            Ok(Command::Leave) => {
                self.clear_status();
                vec![AppAction::Leave, AppAction::Render]
            },
            Ok(Command::Quit) => vec![AppAction::Quit],
            Err(e) => {
                self.status_message = Some(e.to_string());
                vec![AppAction::Render]
            },
        }
    }

    /// Set a status message to display to the user.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Clear the status message.
    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    /// Current status message, if any.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Composer line being edited.
    pub fn composer(&self) -> &Composer {
        &self.composer
    }
}
