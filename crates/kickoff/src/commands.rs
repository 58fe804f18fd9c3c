//! Outbound commands.

use std::fmt;
use std::sync::Arc;

use kickoff_protocol::{GameInit, OutboundCommand, ViewQuality, ViewWidth, encode};
use kickoff_session::{DispatchState, SessionError};
use kickoff_transport::UdpSession;

/// Sends commands to the server on behalf of one player.
///
/// Cloning is cheap; every clone talks through the same session. Sends are
/// fire-and-forget: the server never acknowledges a command, and a failed
/// send is logged rather than returned, since the next cycle's command
/// supersedes it anyway. None of the methods wait, so they can be called
/// from inside [`SensorHandler`](crate::SensorHandler) callbacks.
#[derive(Clone)]
pub struct CommandSink {
    session: Arc<UdpSession>,
    state: Arc<DispatchState>,
}

impl CommandSink {
    pub(crate) fn new(session: Arc<UdpSession>, state: Arc<DispatchState>) -> Self {
        Self { session, state }
    }

    /// Encodes and sends any command. Dropped if the session has stopped,
    /// or if an argument is NaN or infinite.
    pub fn send(&self, command: OutboundCommand) {
        if !self.state.is_active() {
            tracing::debug!(
                id = %self.session.id(),
                command = command.name(),
                "session stopped, dropping command"
            );
            return;
        }
        if !command.is_finite() {
            tracing::warn!(
                id = %self.session.id(),
                %command,
                "non-finite argument, dropping command"
            );
            return;
        }
        self.transmit(&command);
    }

    /// Teleports the player. Only honoured before kick-off and after goals.
    pub fn move_to(&self, x: f64, y: f64) {
        self.send(OutboundCommand::Move { x, y });
    }

    /// Turns the body by `moment` degrees.
    pub fn turn(&self, moment: f64) {
        self.send(OutboundCommand::Turn { moment });
    }

    /// Turns the head relative to the body.
    pub fn turn_neck(&self, moment: f64) {
        self.send(OutboundCommand::TurnNeck { moment });
    }

    /// Accelerates forward (negative `power` runs backwards).
    pub fn dash(&self, power: f64) {
        self.send(OutboundCommand::Dash { power });
    }

    /// Kicks the ball with `power` towards `direction` degrees.
    pub fn kick(&self, power: f64, direction: f64) {
        self.send(OutboundCommand::Kick { power, direction });
    }

    /// Broadcasts `text` to players within hearing range.
    pub fn say(&self, text: impl Into<String>) {
        self.send(OutboundCommand::Say { text: text.into() });
    }

    /// Trades view cone width against how often `see` messages arrive.
    pub fn change_view(&self, width: ViewWidth, quality: ViewQuality) {
        self.send(OutboundCommand::ChangeView { width, quality });
    }

    /// Goalie only.
    pub fn catch(&self, direction: f64) {
        self.send(OutboundCommand::Catch { direction });
    }

    /// Asks for an immediate `sense_body` report.
    pub fn sense_body(&self) {
        self.send(OutboundCommand::SenseBody);
    }

    /// Leaves the game.
    ///
    /// Stops the session before `(bye)` goes out, so no event decoded after
    /// this call reaches the handler, then closes the socket, which wakes the
    /// receive loop. Calling it again is a no-op.
    pub fn bye(&self) {
        if !self.state.stop() {
            tracing::debug!(id = %self.session.id(), "bye on a stopped session");
            return;
        }
        self.transmit(&OutboundCommand::Bye);
        self.session.close();
        tracing::info!(id = %self.session.id(), "said bye");
    }

    /// `true` until `bye` or the receive loop ends.
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Waits until the session stops, whether through `bye` or because the
    /// receive loop ended.
    pub async fn stopped(&self) {
        self.state.stopped().await;
    }

    /// The game init, if the handshake has completed.
    pub fn game_init(&self) -> Option<GameInit> {
        self.state.game_init()
    }

    /// Waits until the game init has been published.
    ///
    /// # Errors
    /// [`SessionError::Stopped`] if the session stops first.
    pub async fn wait_for_game_init(&self) -> Result<GameInit, SessionError> {
        self.state.wait_for_game_init().await
    }

    fn transmit(&self, command: &OutboundCommand) {
        if let Err(e) = self.session.try_send(&encode(command)) {
            tracing::warn!(
                id = %self.session.id(),
                command = command.name(),
                error = %e,
                "send failed"
            );
        }
    }
}

impl fmt::Debug for CommandSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSink")
            .field("id", &self.session.id())
            .field("target", &self.session.target())
            .field("state", &self.state.state())
            .finish()
    }
}
