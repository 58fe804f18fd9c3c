//! Shared session state for Kickoff.
//!
//! The receive loop and the decision logic run concurrently. The little
//! they need to agree on lives here, in [`DispatchState`]:
//!
//! 1. **Activity**: whether the session is still [`SessionState::Running`].
//!    Saying `bye` stops it; the receive loop exits once it notices.
//! 2. **Game init**: the side, uniform number and play mode assigned by the
//!    server, published once after the handshake and awaited by anyone who
//!    needs it.
//!
//! # How it fits in the stack
//!
//! ```text
//! Client (above)  ← receive loop + command sink share one DispatchState
//!     ↕
//! Session Layer (this crate)  ← activity flag, one-shot game init
//!     ↕
//! Protocol Layer (below)  ← provides GameInit
//! ```

mod dispatch;
mod error;

pub use dispatch::{DispatchState, SessionState};
pub use error::SessionError;
