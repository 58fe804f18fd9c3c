//! Wire protocol for Kickoff.
//!
//! The simulation server speaks a parenthesized text protocol over UDP.
//! This crate is the translation layer between that text and Rust types:
//!
//! - **Types** ([`SensorEvent`], [`GameInit`], [`OutboundCommand`], ...):
//!   what the client receives and sends.
//! - **Codec** ([`decode`], [`decode_message_kind`], [`encode`], ...):
//!   pure functions converting between text and those types.
//! - **Errors** ([`ParseError`]): what can be wrong with inbound text.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (datagrams) and the client
//! (event dispatch). It does not know about sockets or sessions.
//!
//! ```text
//! Transport (Datagram) → Protocol (Inbound / OutboundCommand) → Client
//! ```
//!
//! # Example
//!
//! ```rust
//! use kickoff_protocol::{decode, encode, Inbound, OutboundCommand, SensorEvent};
//!
//! let datagram = encode(&OutboundCommand::Kick { power: 100.0, direction: 45.0 });
//! assert_eq!(datagram.text(), "(kick 100.0 45.0)");
//!
//! match decode("(hear 12 referee kick_off_l)").unwrap() {
//!     Inbound::Sensor(SensorEvent::Auditory(heard)) => assert_eq!(heard.text, "kick_off_l"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

mod codec;
mod error;
pub mod sexp;
mod types;

pub use codec::{
    decode, decode_body, decode_command, decode_hear, decode_init, decode_message_kind,
    decode_visual, encode,
};
pub use error::ParseError;
pub use types::{
    AuditoryEvent, BodyEvent, GameInit, Inbound, MessageKind, ObjectKind, OutboundCommand,
    SeenObject, Sender, SensorEvent, Side, Speed, Stamina, ViewMode, ViewQuality, ViewWidth,
    VisualEvent,
};
