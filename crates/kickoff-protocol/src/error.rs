//! Error types for the protocol layer.
//!
//! Every variant carries the offending text (or the part of it that could
//! not be read), since the usual reaction to a parse error is to log it and
//! drop the datagram.

/// Errors that can occur while decoding server messages.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// The text is not a `(<word> ...)` envelope, or the word is not a
    /// message kind this client knows.
    #[error("unrecognized message: {0}")]
    UnrecognizedFormat(String),

    /// An `init` message that does not match `(init <side> <number> <mode>)`.
    #[error("malformed init message: {0}")]
    MalformedInit(String),

    /// A `hear` message that does not match `(hear <time> <sender> <text>)`.
    #[error("malformed hear message: {0}")]
    MalformedHear(String),

    /// A `see` message whose object list could not be read.
    #[error("malformed see message: {0}")]
    MalformedVisual(String),

    /// A `sense_body` message whose fields could not be read.
    #[error("malformed sense_body message: {0}")]
    MalformedBody(String),
}
