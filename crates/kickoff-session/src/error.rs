//! Error types for the session layer.

/// Errors that can occur while waiting on session state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The session stopped before the awaited state was reached, e.g. it
    /// ended before any game init was published.
    #[error("session stopped")]
    Stopped,
}
