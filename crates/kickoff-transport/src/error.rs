/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server's answer to the `init` command was missing, late, or
    /// not a valid init acknowledgment.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// The session was closed. Expected during shutdown.
    #[error("session closed")]
    Closed,

    /// Sending a datagram failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving a datagram failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding the local endpoint failed.
    #[error("bind failed: {0}")]
    BindFailed(#[source] std::io::Error),

    /// The server host could not be resolved to an address.
    #[error("could not resolve {0}")]
    ResolveFailed(String),
}
