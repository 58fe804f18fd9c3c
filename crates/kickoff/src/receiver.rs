//! The receive loop: datagrams in, sensor events out.
//!
//! One task per client runs [`receive_loop`] until the session closes:
//!   1. Wait for the next datagram (or `Closed`)
//!   2. Drop it if the session has stopped
//!   3. Decode it → deliver sensor events to the handler
//!
//! A datagram that fails to decode is skipped; it never ends the loop.

use std::sync::Arc;

use kickoff_protocol::{Inbound, decode};
use kickoff_session::DispatchState;
use kickoff_transport::{Datagram, SessionId, TransportError, UdpSession};

use crate::agent::{SensorHandler, deliver};

/// Runs until the session is closed, then leaves it stopped and closed.
pub(crate) async fn receive_loop<H: SensorHandler>(
    session: Arc<UdpSession>,
    state: Arc<DispatchState>,
    mut handler: H,
) {
    let id = session.id();
    tracing::info!(%id, "receive loop started");

    while state.is_active() {
        let result = session.receive().await;
        match next_step(id, &state, result) {
            Step::Dispatch(datagram) => dispatch(id, &state, &mut handler, &datagram),
            Step::Skip => {}
            Step::Stop => break,
        }
    }

    state.stop();
    session.close();
    tracing::info!(%id, "receive loop stopped");
}

/// What the loop does with one receive result.
#[derive(Debug)]
enum Step {
    Dispatch(Datagram),
    Skip,
    Stop,
}

fn next_step(
    id: SessionId,
    state: &DispatchState,
    result: Result<Datagram, TransportError>,
) -> Step {
    match result {
        Ok(_) if !state.is_active() => {
            tracing::debug!(%id, "session stopped, dropping datagram");
            Step::Stop
        }
        Ok(datagram) => Step::Dispatch(datagram),
        Err(TransportError::Closed) => {
            tracing::debug!(%id, "session closed");
            Step::Stop
        }
        Err(e) => {
            // ICMP errors from an earlier send surface here; the next
            // receive is unaffected.
            tracing::warn!(%id, error = %e, "receive failed");
            Step::Skip
        }
    }
}

/// Decodes one datagram and acts on it.
fn dispatch<H: SensorHandler>(
    id: SessionId,
    state: &DispatchState,
    handler: &mut H,
    datagram: &Datagram,
) {
    let text = datagram.text();
    let inbound = match decode(&text) {
        Ok(inbound) => inbound,
        Err(e) => {
            tracing::debug!(%id, error = %e, "skipping undecodable datagram");
            return;
        }
    };

    match inbound {
        Inbound::Sensor(event) => {
            tracing::trace!(%id, time = event.time(), "delivering event");
            deliver(handler, event);
        }
        Inbound::Init(init) => {
            // A repeated init (e.g. after a reconnect) never replaces the first.
            state.publish_init(init);
        }
        Inbound::ServerError(reason) => {
            tracing::warn!(%id, %reason, "server reported an error");
        }
        Inbound::ServerWarning(reason) => {
            tracing::warn!(%id, %reason, "server reported a warning");
        }
        Inbound::Ignored(kind) => {
            tracing::trace!(%id, ?kind, "ignoring message");
        }
    }
}
