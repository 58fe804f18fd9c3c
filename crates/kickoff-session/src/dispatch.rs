//! The dispatch state shared by the receive loop and the command sink.

use std::fmt;

use kickoff_protocol::GameInit;
use tokio::sync::watch;

use crate::SessionError;

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Whether a session is still exchanging messages.
///
/// ```text
///   Running ──(bye / socket closed)──→ Stopped
/// ```
///
/// There is no way back: a stopped session stays stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Running,
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

// ---------------------------------------------------------------------------
// DispatchState
// ---------------------------------------------------------------------------

/// Activity flag plus the one-shot game init, shared behind an `Arc`.
///
/// Both halves are `watch` channels, so waiting is a suspension point
/// rather than a poll: [`wait_for_game_init`](Self::wait_for_game_init)
/// and [`stopped`](Self::stopped) wake exactly when the value changes.
pub struct DispatchState {
    state: watch::Sender<SessionState>,
    init: watch::Sender<Option<GameInit>>,
}

impl DispatchState {
    /// Creates a running state with no game init yet.
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::Running);
        let (init, _) = watch::channel(None);
        Self { state, init }
    }

    /// The current state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// `true` while the session is [`SessionState::Running`].
    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Running
    }

    /// Moves to [`SessionState::Stopped`]. Returns `true` only for the call
    /// that made the transition.
    pub fn stop(&self) -> bool {
        let stopped = self.state.send_if_modified(|state| match state {
            SessionState::Running => {
                *state = SessionState::Stopped;
                true
            }
            SessionState::Stopped => false,
        });
        if stopped {
            tracing::debug!("dispatch state stopped");
        }
        stopped
    }

    /// Waits until the session is stopped.
    pub async fn stopped(&self) {
        let mut state = self.state.subscribe();
        // The sender lives in `self`, so this can't observe a closed channel.
        let _ = state.wait_for(|s| *s == SessionState::Stopped).await;
    }

    /// Publishes the game init. Only the first call has an effect; the
    /// init is immutable for the rest of the session.
    pub fn publish_init(&self, init: GameInit) -> bool {
        let published = self.init.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(init);
            true
        });
        if !published {
            tracing::debug!("game init already published, ignoring");
        }
        published
    }

    /// The game init, if already published.
    pub fn game_init(&self) -> Option<GameInit> {
        self.init.borrow().clone()
    }

    /// Waits for the game init.
    ///
    /// Returns immediately if it was already published, even if the session
    /// has stopped since.
    ///
    /// # Errors
    /// [`SessionError::Stopped`] if the session stops first.
    pub async fn wait_for_game_init(&self) -> Result<GameInit, SessionError> {
        let mut init = self.init.subscribe();
        let mut state = self.state.subscribe();

        tokio::select! {
            biased;
            published = init.wait_for(Option::is_some) => {
                published
                    .ok()
                    .and_then(|init| (*init).clone())
                    .ok_or(SessionError::Stopped)
            }
            _ = state.wait_for(|s| *s == SessionState::Stopped) => {
                Err(SessionError::Stopped)
            }
        }
    }
}

impl Default for DispatchState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchState")
            .field("state", &self.state())
            .field("init", &self.game_init())
            .finish()
    }
}

// =========================================================================
// Tests
// =========================================================================
