//! UDP session transport for Kickoff.
//!
//! Provides [`UdpSession`], the sole owner of the socket used to talk to
//! the simulation server, and [`Datagram`], the fixed-size frame every
//! message travels in.
//!
//! The transport knows nothing about the text protocol. The handshake is
//! driven by the caller: it supplies the encoded `init` datagram and a
//! closure that decides whether the server's answer is acceptable.

mod datagram;
mod error;
mod udp;

pub use datagram::{DATAGRAM_CAPACITY, Datagram};
pub use error::TransportError;
pub use udp::UdpSession;

use std::fmt;

/// Opaque identifier for a session, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Creates a new `SessionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}
