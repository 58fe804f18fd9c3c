//! Fixed-size datagram framing.
//!
//! The server reads and writes every message into a buffer of
//! [`DATAGRAM_CAPACITY`] bytes. Shorter messages are padded with NUL bytes,
//! longer ones are cut off. There is no length prefix: the padding *is* the
//! framing, so a `Datagram` always carries the full buffer and exposes the
//! meaningful prefix through [`Datagram::payload`].

use std::borrow::Cow;
use std::fmt;

/// Size of every datagram sent or received, in bytes.
pub const DATAGRAM_CAPACITY: usize = 4096;

/// One full-size datagram buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct Datagram {
    buf: Box<[u8]>,
}

impl Datagram {
    /// Creates an all-zero datagram, ready to be received into.
    pub fn zeroed() -> Self {
        Self {
            buf: vec![0; DATAGRAM_CAPACITY].into_boxed_slice(),
        }
    }

    /// Copies `data` into a new datagram, zero-padding or truncating it to
    /// [`DATAGRAM_CAPACITY`].
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut datagram = Self::zeroed();
        let len = data.len().min(DATAGRAM_CAPACITY);
        datagram.buf[..len].copy_from_slice(&data[..len]);
        datagram
    }

    /// Convenience for [`from_bytes`](Self::from_bytes) on UTF-8 text.
    pub fn from_text(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }

    /// The full buffer, padding included. Always `DATAGRAM_CAPACITY` long.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub(crate) fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// The buffer with trailing NUL padding stripped.
    pub fn payload(&self) -> &[u8] {
        let end = self
            .buf
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |last| last + 1);
        &self.buf[..end]
    }

    /// The payload as text. Invalid UTF-8 is replaced, not rejected, so a
    /// garbled datagram still reaches the decoder and fails there.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.payload())
    }

    /// Returns `true` if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload().is_empty()
    }
}

impl Default for Datagram {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl fmt::Debug for Datagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Datagram").field(&self.text()).finish()
    }
}
