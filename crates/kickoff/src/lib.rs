//! # Kickoff
//!
//! Client library for the RoboCup 2D soccer simulation server.
//!
//! Kickoff connects one player over UDP, decodes the server's sensor
//! messages into typed events, and hands them to a [`SensorHandler`] you
//! implement. Commands go back through a [`CommandSink`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kickoff::prelude::*;
//! use tokio::sync::mpsc;
//!
//! # async fn run() -> Result<(), KickoffError> {
//! let client = Client::builder().team("Krislet").connect().await?;
//! let commands = client.commands();
//! commands.move_to(-10.0, 0.0);
//!
//! let (tx, mut events) = mpsc::unbounded_channel();
//! let handle = client.spawn(tx);
//! while let Some(event) = events.recv().await {
//!     if let SensorEvent::Visual(seen) = event {
//!         if seen.ball().is_none() {
//!             commands.turn(40.0);
//!         }
//!     }
//! }
//! handle.join().await
//! # }
//! ```

mod agent;
mod client;
mod commands;
mod error;
mod receiver;

pub use agent::SensorHandler;
pub use client::{Client, ClientBuilder, ClientConfig, ClientHandle, DEFAULT_PROTOCOL_VERSION};
pub use commands::CommandSink;
pub use error::KickoffError;

/// Everything needed to write an agent.
pub mod prelude {
    pub use crate::{
        Client, ClientBuilder, ClientConfig, ClientHandle, CommandSink, KickoffError,
        SensorHandler,
    };

    pub use kickoff_protocol::{
        AuditoryEvent, BodyEvent, GameInit, ObjectKind, OutboundCommand, SeenObject, Sender,
        SensorEvent, Side, ViewQuality, ViewWidth, VisualEvent,
    };
    pub use kickoff_session::SessionError;
    pub use kickoff_transport::TransportError;
}
