//! Multi-client simulation world.
//!
//! A [`SimWorld`] wires several production runtimes to one relay and one
//! virtual clock, then steps them until the traffic settles.

use std::time::Duration;

use parley_app::Runtime;
use parley_client::{Identity, SessionConfig};

use crate::{ClientSnapshot, SimDriver, SimDriverError, SimEnv, SimRelay, SystemSnapshot};

/// Upper bound on settle rounds. A healthy exchange settles in a handful.
const MAX_SETTLE_ROUNDS: usize = 1_000;

/// One simulated user running the production runtime.
pub struct SimClient {
    runtime: Runtime<SimDriver, SimEnv>,
}

impl SimClient {
    /// The client's driver, for injecting input and reading renders.
    pub fn driver(&self) -> &SimDriver {
        self.runtime.driver()
    }

    /// The runtime under test.
    pub fn runtime(&self) -> &Runtime<SimDriver, SimEnv> {
        &self.runtime
    }

    /// Observable state as of the last render.
    pub fn snapshot(&self) -> ClientSnapshot {
        self.driver().snapshot()
    }
}

/// Clients sharing a relay and a clock.
pub struct SimWorld {
    env: SimEnv,
    relay: SimRelay,
    clients: Vec<SimClient>,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    /// Empty world at time zero.
    pub fn new() -> Self {
        let env = SimEnv::new();
        Self { relay: SimRelay::new(env.clone()), env, clients: Vec::new() }
    }

    /// Shared clock.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Shared backend.
    pub fn relay(&self) -> &SimRelay {
        &self.relay
    }

    /// Register a user and start a client for them with default settings.
    pub fn add_client(&mut self, user_id: u64, username: &str) -> usize {
        self.add_client_with(user_id, username, SessionConfig::default())
    }

    /// Register a user and start a client with `config`.
    pub fn add_client_with(&mut self, user_id: u64, username: &str, config: SessionConfig) -> usize {
        self.relay.register_user(user_id, username);
        let runtime = Runtime::new(
            SimDriver::new(self.relay.clone()),
            self.env.clone(),
            Identity::new(user_id, username),
            config,
            Some(format!("token-{user_id}")),
        );
        self.clients.push(SimClient { runtime });
        self.clients.len() - 1
    }

    /// Client by index.
    ///
    /// # Panics
    ///
    /// Panics if `index` was not returned by `add_client`.
    pub fn client(&self, index: usize) -> &SimClient {
        &self.clients[index]
    }

    /// Open a room for one client and let the exchange settle.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails.
    pub async fn mount(&mut self, index: usize, peer_id: u64) -> Result<(), SimDriverError> {
        self.clients[index].runtime.mount(peer_id).await?;
        self.settle().await
    }

    /// Step every client until no input or relay traffic is left.
    ///
    /// # Errors
    ///
    /// Returns an error if a driver fails or traffic never settles.
    pub async fn settle(&mut self) -> Result<(), SimDriverError> {
        for _ in 0..MAX_SETTLE_ROUNDS {
            let mut busy = false;
            for client in &mut self.clients {
                if client.runtime.driver().has_pending() {
                    busy = true;
                    client.runtime.step().await?;
                }
            }
            if !busy {
                return Ok(());
            }
        }
        Err(SimDriverError(format!("traffic did not settle in {MAX_SETTLE_ROUNDS} rounds")))
    }

    /// Move the clock forward, tick every client and settle.
    ///
    /// # Errors
    ///
    /// Returns an error if a driver fails.
    pub async fn advance(&mut self, duration: Duration) -> Result<(), SimDriverError> {
        self.env.advance(duration);
        for client in &mut self.clients {
            client.runtime.step().await?;
        }
        self.settle().await
    }

    /// Snapshot of every client.
    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot::from_clients(self.clients.iter().map(SimClient::snapshot).collect())
    }
}
