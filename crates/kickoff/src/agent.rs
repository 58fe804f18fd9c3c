//! The seam between the receive loop and decision logic.

use kickoff_protocol::{AuditoryEvent, BodyEvent, SensorEvent, VisualEvent};
use tokio::sync::mpsc;

/// Receives decoded sensor events, one call per datagram, in arrival order.
///
/// Callbacks run on the receive loop's task. They should return quickly:
/// while a callback runs, newer datagrams queue up in the socket buffer.
/// Decision logic that needs to think for longer should run in its own task
/// and be fed through a channel; `mpsc::UnboundedSender<SensorEvent>` and
/// `mpsc::Sender<SensorEvent>` implement this trait for that purpose.
///
/// # Example
///
/// ```rust
/// use kickoff::prelude::*;
///
/// struct BallWatcher {
///     commands: CommandSink,
/// }
///
/// impl SensorHandler for BallWatcher {
///     fn on_visual(&mut self, event: VisualEvent) {
///         if event.ball().is_none() {
///             self.commands.turn(40.0);
///         }
///     }
///
///     fn on_auditory(&mut self, _event: AuditoryEvent) {}
/// }
/// ```
pub trait SensorHandler: Send + 'static {
    /// Called for each `see` message.
    fn on_visual(&mut self, event: VisualEvent);

    /// Called for each `hear` message.
    fn on_auditory(&mut self, event: AuditoryEvent);

    /// Called for each `sense_body` message. Ignored by default.
    fn on_body(&mut self, event: BodyEvent) {
        let _ = event;
    }
}

/// Routes an event to the matching callback.
pub(crate) fn deliver<H: SensorHandler>(handler: &mut H, event: SensorEvent) {
    match event {
        SensorEvent::Visual(event) => handler.on_visual(event),
        SensorEvent::Auditory(event) => handler.on_auditory(event),
        SensorEvent::Body(event) => handler.on_body(event),
    }
}

impl SensorHandler for mpsc::UnboundedSender<SensorEvent> {
    fn on_visual(&mut self, event: VisualEvent) {
        forward_unbounded(self, SensorEvent::Visual(event));
    }

    fn on_auditory(&mut self, event: AuditoryEvent) {
        forward_unbounded(self, SensorEvent::Auditory(event));
    }

    fn on_body(&mut self, event: BodyEvent) {
        forward_unbounded(self, SensorEvent::Body(event));
    }
}

fn forward_unbounded(tx: &mpsc::UnboundedSender<SensorEvent>, event: SensorEvent) {
    if tx.send(event).is_err() {
        tracing::trace!("event receiver dropped, discarding event");
    }
}

/// A bounded channel drops events when full instead of stalling the loop.
impl SensorHandler for mpsc::Sender<SensorEvent> {
    fn on_visual(&mut self, event: VisualEvent) {
        forward_bounded(self, SensorEvent::Visual(event));
    }

    fn on_auditory(&mut self, event: AuditoryEvent) {
        forward_bounded(self, SensorEvent::Auditory(event));
    }

    fn on_body(&mut self, event: BodyEvent) {
        forward_bounded(self, SensorEvent::Body(event));
    }
}

fn forward_bounded(tx: &mpsc::Sender<SensorEvent>, event: SensorEvent) {
    match tx.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(event)) => {
            tracing::debug!(time = event.time(), "event channel full, dropping event");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            tracing::trace!("event receiver dropped, discarding event");
        }
    }
}
