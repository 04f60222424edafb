//! Generic runtime for application orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`App`]: UI state machine
//! - [`ChatSession`]: room, socket, history and typing state
//! - [`Driver`]: Platform-specific I/O

use parley_client::{ChatSession, Identity, SessionAction, SessionConfig, SessionEvent};
use parley_core::Environment;

use crate::{App, AppAction, ChatView, Driver};

/// Generic runtime that orchestrates App, session and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment supplying the clock for the typing debounce
pub struct Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    env: E,
    app: App,
    session: ChatSession<E::Instant>,
    auth_token: Option<String>,
}

impl<D, E> Runtime<D, E>
where
    D: Driver<Instant = E::Instant>,
    E: Environment,
{
    /// Create a runtime for the given local user.
    pub fn new(
        driver: D,
        env: E,
        identity: Identity,
        config: SessionConfig,
        auth_token: Option<String>,
    ) -> Self {
        Self {
            driver,
            env,
            app: App::new(),
            session: ChatSession::new(identity, config),
            auth_token,
        }
    }

    /// Run the main event loop until the user quits.
    ///
    /// Opens the room with `peer_id` first when one is given. On exit the
    /// room is unmounted and the driver stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self, peer_id: Option<u64>) -> Result<(), D::Error> {
        self.render()?;
        if let Some(peer_id) = peer_id {
            self.mount(peer_id).await?;
        }

        loop {
            if self.step().await? {
                break;
            }
        }

        self.dispatch(SessionEvent::Unmount).await?;
        self.driver.stop();
        Ok(())
    }

    /// Open the room shared with `peer_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn mount(&mut self, peer_id: u64) -> Result<(), D::Error> {
        let auth_token = self.auth_token.clone();
        self.dispatch(SessionEvent::Mount { peer_id, auth_token }).await
    }

    /// Process one cycle of the event loop.
    ///
    /// 1. Polls for one input event and runs the App's actions
    /// 2. Drains signals from the driver into the session
    /// 3. Ticks the session clock
    ///
    /// Returns `true` if the application should quit.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn step(&mut self) -> Result<bool, D::Error> {
        if let Some(event) = self.driver.poll_event().await? {
            let actions = self.app.handle(event);
            if self.process_actions(actions).await? {
                return Ok(true);
            }
        }

        while let Some(signal) = self.driver.recv_signal() {
            self.dispatch(signal.into_session_event()).await?;
        }

        let now = self.env.now();
        self.dispatch(SessionEvent::Tick { now }).await?;

        Ok(false)
    }

    /// Process actions returned by the App.
    ///
    /// Returns `true` if should quit.
    async fn process_actions(&mut self, actions: Vec<AppAction>) -> Result<bool, D::Error> {
        for action in actions {
            match action {
                AppAction::Render => self.render()?,
                AppAction::Quit => return Ok(true),
                AppAction::Keystroke => {
                    // Editing with no room open is just editing.
                    if self.session.room().is_some() {
                        let now = self.env.now();
                        self.dispatch(SessionEvent::Keystroke { now }).await?;
                    }
                },
                AppAction::SendMessage { text } => {
                    self.dispatch(SessionEvent::SendMessage { text }).await?;
                },
                AppAction::SwitchPeer { peer_id } => self.mount(peer_id).await?,
                AppAction::MarkRead { message_id } => {
                    self.dispatch(SessionEvent::MarkAsRead { message_id }).await?;
                },
                AppAction::Leave => self.dispatch(SessionEvent::Unmount).await?,
            }
        }
        Ok(false)
    }

    /// Feed one event to the session and execute its actions.
    ///
    /// Session errors are caller mistakes (no room open, chatting with
    /// yourself) and end up on the status line.
    async fn dispatch(&mut self, event: SessionEvent<E::Instant>) -> Result<(), D::Error> {
        match self.session.handle(event) {
            Ok(actions) => self.execute(actions).await,
            Err(e) => {
                tracing::debug!(error = %e, "session rejected event");
                self.app.set_status(e.to_string());
                self.render()
            },
        }
    }

    async fn execute(&mut self, actions: Vec<SessionAction>) -> Result<(), D::Error> {
        for action in actions {
            match action {
                SessionAction::Open(request) => self.driver.open(&request),
                SessionAction::SendFrame(text) => self.driver.send_text(text).await?,
                SessionAction::Close => self.driver.close(),
                SessionAction::FetchHistory { room_id, auth_token } => {
                    self.driver.fetch_history(room_id, auth_token);
                },
                SessionAction::Render => self.render()?,
            }
        }
        Ok(())
    }

    fn render(&mut self) -> Result<(), D::Error> {
        self.driver.render(&ChatView::new(&self.app, &self.session))
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Get a reference to the session
    pub fn session(&self) -> &ChatSession<E::Instant> {
        &self.session
    }

    /// Get a reference to the driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}
