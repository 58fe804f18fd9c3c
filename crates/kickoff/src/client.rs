//! `Client` builder, handshake, and receive-loop spawning.
//!
//! This is the entry point for connecting a player. It ties together all
//! the layers: transport → protocol → session → handler.

use std::sync::Arc;
use std::time::Duration;

use kickoff_protocol::{GameInit, Inbound, OutboundCommand, decode, encode};
use kickoff_session::DispatchState;
use kickoff_transport::{Datagram, UdpSession};
use serde::Deserialize;
use tokio::task::JoinHandle;

use crate::agent::SensorHandler;
use crate::commands::CommandSink;
use crate::receiver::receive_loop;
use crate::KickoffError;

/// The protocol version sent in the handshake unless configured otherwise.
pub const DEFAULT_PROTOCOL_VERSION: u32 = 9;

/// Where to connect and who to play as.
///
/// Missing fields take their [`Default`] values when deserialized, so a
/// config file only needs the fields it changes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server host name or address.
    pub host: String,
    /// The server's well-known player port.
    pub port: u16,
    /// Team name sent in the handshake.
    pub team: String,
    /// Protocol version announced in the handshake.
    pub protocol_version: u32,
    /// How long to wait for the init reply. `None` waits indefinitely.
    pub handshake_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6000,
            team: "Kickoff".to_string(),
            protocol_version: DEFAULT_PROTOCOL_VERSION,
            handshake_timeout: None,
        }
    }
}

/// Builder for configuring and connecting a [`Client`].
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use kickoff::prelude::*;
///
/// # async fn run() -> Result<(), KickoffError> {
/// let client = Client::builder()
///     .host("127.0.0.1")
///     .team("Krislet")
///     .handshake_timeout(Duration::from_secs(5))
///     .connect()
///     .await?;
/// println!("playing as {:?}", client.game_init());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server host name or address. Default `localhost`.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the server's player port. Default `6000`.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the team name sent in the handshake.
    pub fn team(mut self, team: impl Into<String>) -> Self {
        self.config.team = team.into();
        self
    }

    /// Sets the protocol version sent in the handshake. Default
    /// [`DEFAULT_PROTOCOL_VERSION`].
    pub fn protocol_version(mut self, version: u32) -> Self {
        self.config.protocol_version = version;
        self
    }

    /// Bounds the wait for the server's init reply.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = Some(timeout);
        self
    }

    /// Replaces every setting at once.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Opens the session and performs the handshake.
    pub async fn connect(self) -> Result<Client, KickoffError> {
        Client::connect(self.config).await
    }
}

/// A player that has completed the handshake.
///
/// Call [`spawn()`](Self::spawn) to start receiving sensor events.
pub struct Client {
    session: Arc<UdpSession>,
    state: Arc<DispatchState>,
    init: GameInit,
}

impl Client {
    /// Creates a new builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Opens a session to `config.host:config.port`, sends
    /// `(init <team> (version <n>))` and waits for the init reply.
    ///
    /// # Errors
    /// [`TransportError::HandshakeFailed`](kickoff_transport::TransportError::HandshakeFailed)
    /// if the server refused the player, answered with something other than
    /// an init, or did not answer within `handshake_timeout`.
    pub async fn connect(config: ClientConfig) -> Result<Self, KickoffError> {
        let hello = encode(&OutboundCommand::Init {
            team: config.team.clone(),
            version: config.protocol_version,
        });

        let (session, init) = UdpSession::open(
            &config.host,
            config.port,
            &hello,
            config.handshake_timeout,
            accept_init,
        )
        .await?;

        let state = Arc::new(DispatchState::new());
        state.publish_init(init.clone());

        tracing::info!(
            id = %session.id(),
            team = %config.team,
            side = %init.side,
            number = init.number,
            play_mode = %init.play_mode,
            "joined game"
        );

        Ok(Self {
            session: Arc::new(session),
            state,
            init,
        })
    }

    /// The handshake result.
    pub fn game_init(&self) -> &GameInit {
        &self.init
    }

    /// A sink for sending commands. Usable before and after [`spawn`](Self::spawn).
    pub fn commands(&self) -> CommandSink {
        CommandSink::new(Arc::clone(&self.session), Arc::clone(&self.state))
    }

    /// Starts the receive loop on a new task, delivering events to
    /// `handler` until `bye` or the session closes.
    pub fn spawn<H: SensorHandler>(self, handler: H) -> ClientHandle {
        let commands = self.commands();
        let task = tokio::spawn(receive_loop(
            Arc::clone(&self.session),
            Arc::clone(&self.state),
            handler,
        ));
        ClientHandle { commands, task }
    }
}

/// Handshake acceptance: the reply must decode as an init.
fn accept_init(reply: &Datagram) -> Result<GameInit, String> {
    let text = reply.text();
    match decode(&text) {
        Ok(Inbound::Init(init)) => Ok(init),
        Ok(Inbound::ServerError(reason)) => Err(format!("server refused: {reason}")),
        Ok(other) => Err(format!("expected init, got {other:?}")),
        Err(e) => Err(e.to_string()),
    }
}

/// A client whose receive loop is running.
pub struct ClientHandle {
    commands: CommandSink,
    task: JoinHandle<()>,
}

impl ClientHandle {
    /// A sink for sending commands.
    pub fn commands(&self) -> CommandSink {
        self.commands.clone()
    }

    /// Waits for the game init. It is published during the handshake, so
    /// this only fails if the session was stopped first.
    pub async fn wait_for_game_init(&self) -> Result<GameInit, KickoffError> {
        Ok(self.commands.wait_for_game_init().await?)
    }

    /// The game init received during the handshake.
    pub fn game_init(&self) -> Option<GameInit> {
        self.commands.game_init()
    }

    /// `true` until `bye` or the receive loop ends.
    pub fn is_active(&self) -> bool {
        self.commands.is_active()
    }

    /// Waits until the session stops. The receive loop may still be
    /// shutting down; use [`join`](Self::join) to wait for it.
    pub async fn stopped(&self) {
        self.commands.stopped().await;
    }

    /// Waits for the receive loop to finish.
    ///
    /// # Errors
    /// [`KickoffError::ReceiveLoop`] if the handler panicked.
    pub async fn join(self) -> Result<(), KickoffError> {
        Ok(self.task.await?)
    }
}
