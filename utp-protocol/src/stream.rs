//! Byte-Stream Endpoints
//!
//! The application talks to a connection through two byte streams: one it
//! writes outbound data into, one it reads delivered data from. Both are
//! plain buffers shared between the application side and the connection's
//! reactor side; the protocol machinery drains the output buffer into DATA
//! packets and the reorderer fills the input buffer with in-order bytes.

use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::Arc;

/// Per-direction stream lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Bytes are flowing
    Active,
    /// Shutdown requested, final packet not yet sent
    ShutdownPending,
    /// Direction fully shut down
    Shutdown,
}

#[derive(Default)]
struct BufferInner {
    data: VecDeque<u8>,
    /// No further bytes will ever be added (FIN fully delivered, or the
    /// application closed its writing side)
    finished: bool,
    /// The connection was reset; both endpoints fail fast
    reset: bool,
}

/// Buffer shared between an application endpoint and the connection core
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer {
    inner: Arc<Mutex<BufferInner>>,
}

impl SharedBuffer {
    pub(crate) fn new() -> Self {
        SharedBuffer::default()
    }

    /// Append in-order payload chunks (reactor side of the input stream)
    pub(crate) fn push_chunks(&self, chunks: Vec<Bytes>) {
        let mut inner = self.inner.lock();
        for chunk in chunks {
            inner.data.extend(chunk.iter());
        }
    }

    /// Take up to `max` buffered bytes (reactor side of the output stream)
    pub(crate) fn drain(&self, max: usize) -> Bytes {
        let mut inner = self.inner.lock();
        let take = max.min(inner.data.len());
        let drained: Vec<u8> = inner.data.drain(..take).collect();
        Bytes::from(drained)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.inner.lock().data.is_empty()
    }

    /// Mark that no further bytes will ever be added
    pub(crate) fn set_finished(&self) {
        self.inner.lock().finished = true;
    }

    /// Mark the connection as reset; pending bytes are discarded
    pub(crate) fn set_reset(&self) {
        let mut inner = self.inner.lock();
        inner.reset = true;
        inner.data.clear();
    }
}

/// Application-facing read end of a connection's inbound byte stream
///
/// Reads never block: an empty stream fails with [`io::ErrorKind::WouldBlock`]
/// while the connection is alive, returns `Ok(0)` once all bytes through the
/// remote's FIN have been consumed, and fails with
/// [`io::ErrorKind::ConnectionReset`] after a RESET.
pub struct UtpInputStream {
    buffer: SharedBuffer,
}

impl UtpInputStream {
    pub(crate) fn new(buffer: SharedBuffer) -> Self {
        UtpInputStream { buffer }
    }
}

impl Read for UtpInputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.buffer.inner.lock();

        if inner.reset {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection was reset by the remote",
            ));
        }
        if inner.data.is_empty() {
            if inner.finished {
                return Ok(0);
            }
            return Err(io::Error::new(
                io::ErrorKind::WouldBlock,
                "no data available",
            ));
        }

        let take = buf.len().min(inner.data.len());
        for slot in buf.iter_mut().take(take) {
            *slot = inner.data.pop_front().expect("length checked above");
        }
        Ok(take)
    }
}

/// Application-facing write end of a connection's outbound byte stream
///
/// Writes are buffered and drained into DATA packets by the connection's
/// send cycle. Writing fails with [`io::ErrorKind::BrokenPipe`] once the
/// output direction has been shut down and with
/// [`io::ErrorKind::ConnectionReset`] after a RESET.
pub struct UtpOutputStream {
    buffer: SharedBuffer,
}

impl UtpOutputStream {
    pub(crate) fn new(buffer: SharedBuffer) -> Self {
        UtpOutputStream { buffer }
    }
}

impl Write for UtpOutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.buffer.inner.lock();

        if inner.reset {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection was reset by the remote",
            ));
        }
        if inner.finished {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "output direction is shut down",
            ));
        }

        inner.data.extend(buf.iter());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
