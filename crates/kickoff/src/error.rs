//! Unified error type for the Kickoff client.

use kickoff_protocol::ParseError;
use kickoff_session::SessionError;
use kickoff_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `kickoff` crate you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]` attribute
/// on each variant lets `?` convert sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum KickoffError {
    /// A transport-level error (resolve, bind, handshake, closed socket).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An inbound message that could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ParseError),

    /// A session-level error (stopped before the game init arrived).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The receive loop task panicked or was cancelled.
    #[error("receive loop failed: {0}")]
    ReceiveLoop(#[from] tokio::task::JoinError),
}
