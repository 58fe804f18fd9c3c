//! UDP session implementation using `tokio::net::UdpSocket`.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::watch;

use crate::{Datagram, SessionId, TransportError};

/// Counter for generating unique session IDs.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// One UDP conversation with the simulation server.
///
/// The session is the only owner of the socket. Sends and receives take
/// `&self`, so a single session can be shared (behind `Arc`) between the
/// receive loop and whoever issues commands; the two directions never
/// wait on each other.
///
/// ```text
///   open() ──→ [handshake] ──→ send()/receive() ... ──→ close()
///                  │
///                  └─ target port := port the init reply came from
/// ```
pub struct UdpSession {
    id: SessionId,
    /// `None` once the session has been closed.
    socket: Mutex<Option<Arc<UdpSocket>>>,
    /// Fixed after the handshake.
    target: SocketAddr,
    /// Flipped to `true` by `close()`, waking any pending receive.
    closed: watch::Sender<bool>,
}

impl UdpSession {
    /// Opens a session and performs the handshake.
    ///
    /// Binds an ephemeral local endpoint, sends `hello` to `host:port`,
    /// then waits for one reply (forever if `timeout` is `None`). The reply
    /// is handed to `accept`; if it returns `Ok`, the session switches its
    /// target port to the one the reply came from. Servers answer the
    /// handshake from a per-client port, so commands sent to the
    /// well-known port afterwards would be lost.
    ///
    /// # Errors
    /// - [`TransportError::ResolveFailed`] / [`TransportError::BindFailed`]
    ///   if the socket could not be set up.
    /// - [`TransportError::HandshakeFailed`] if no reply arrived in time,
    ///   the receive failed, or `accept` rejected the reply.
    pub async fn open<T, F>(
        host: &str,
        port: u16,
        hello: &Datagram,
        timeout: Option<Duration>,
        accept: F,
    ) -> Result<(Self, T), TransportError>
    where
        F: FnOnce(&Datagram) -> Result<T, String>,
    {
        let target = resolve(host, port).await?;
        let local: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(TransportError::BindFailed)?;

        let id = SessionId::new(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::info!(
            %id,
            local = ?socket.local_addr().ok(),
            %target,
            "UDP session bound"
        );

        let (closed, _) = watch::channel(false);
        let mut session = Self {
            id,
            socket: Mutex::new(Some(Arc::new(socket))),
            target,
            closed,
        };

        session.send(hello).await?;

        let received = match timeout {
            Some(limit) => tokio::time::timeout(limit, session.receive_from())
                .await
                .map_err(|_| {
                    TransportError::HandshakeFailed(format!(
                        "no reply from {target} within {limit:?}"
                    ))
                })?,
            None => session.receive_from().await,
        };
        let (reply, from) = received.map_err(|e| {
            TransportError::HandshakeFailed(format!("no reply from {target}: {e}"))
        })?;

        let value = accept(&reply).map_err(TransportError::HandshakeFailed)?;

        session.target.set_port(from.port());
        tracing::info!(%id, target = %session.target, "handshake complete");

        Ok((session, value))
    }

    /// Sends one full-size datagram to the session's target.
    pub async fn send(&self, datagram: &Datagram) -> Result<(), TransportError> {
        let socket = self.socket()?;
        socket
            .send_to(datagram.as_bytes(), self.target)
            .await
            .map_err(TransportError::SendFailed)?;
        tracing::trace!(id = %self.id, text = %datagram.text(), "datagram sent");
        Ok(())
    }

    /// Sends one datagram without waiting for socket buffer space.
    ///
    /// Usable from synchronous code. If the socket is momentarily not
    /// writable the datagram is dropped with `SendFailed(WouldBlock)`;
    /// a late command is worth less than no command in a fixed-cycle game.
    pub fn try_send(&self, datagram: &Datagram) -> Result<(), TransportError> {
        let socket = self.socket()?;
        socket
            .try_send_to(datagram.as_bytes(), self.target)
            .map_err(TransportError::SendFailed)?;
        tracing::trace!(id = %self.id, text = %datagram.text(), "datagram sent");
        Ok(())
    }

    /// Waits for the next datagram.
    ///
    /// Returns [`TransportError::Closed`] if the session is closed, including
    /// when `close()` is called while this receive is pending.
    pub async fn receive(&self) -> Result<Datagram, TransportError> {
        self.receive_from().await.map(|(datagram, _)| datagram)
    }

    async fn receive_from(&self) -> Result<(Datagram, SocketAddr), TransportError> {
        let socket = self.socket()?;
        let mut closed = self.closed.subscribe();
        let mut datagram = Datagram::zeroed();

        tokio::select! {
            result = socket.recv_from(datagram.as_mut_bytes()) => {
                let (len, from) = result.map_err(TransportError::ReceiveFailed)?;
                tracing::trace!(id = %self.id, len, %from, "datagram received");
                Ok((datagram, from))
            }
            _ = closed.wait_for(|closed| *closed) => Err(TransportError::Closed),
        }
    }

    /// Releases the socket. Returns `true` only for the call that actually
    /// closed it; later calls are no-ops.
    pub fn close(&self) -> bool {
        let released = self.lock_socket().take().is_some();
        if released {
            self.closed.send_replace(true);
            tracing::info!(id = %self.id, "UDP session closed");
        }
        released
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock_socket().is_none()
    }

    /// The session's identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Where datagrams are currently sent.
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// The local address of the socket, if the session is still open.
    ///
    /// # Errors
    /// [`TransportError::Closed`] after `close()`, or
    /// [`TransportError::BindFailed`] if the OS can't report the bound address.
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.socket()?
            .local_addr()
            .map_err(TransportError::BindFailed)
    }

    fn socket(&self) -> Result<Arc<UdpSocket>, TransportError> {
        self.lock_socket().clone().ok_or(TransportError::Closed)
    }

    fn lock_socket(&self) -> MutexGuard<'_, Option<Arc<UdpSocket>>> {
        self.socket.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resolves `host:port`, preferring IPv4 (the server listens on IPv4 only
/// in its default configuration).
async fn resolve(host: &str, port: u16) -> Result<SocketAddr, TransportError> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| TransportError::ResolveFailed(format!("{host}:{port}: {e}")))?
        .collect();

    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| TransportError::ResolveFailed(format!("{host}:{port}: no addresses")))
}
