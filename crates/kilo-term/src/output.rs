// SPDX-License-Identifier: MIT
//
// Output buffering.
//
// A frame is dozens of small pieces: escape sequences, line contents,
// padding, the final cursor move. Writing each piece on its own lets the
// terminal repaint between them, which shows up as flicker and a cursor
// that visibly jumps around. `OutputBuffer` accumulates the whole frame in
// memory so it reaches the terminal in a single write.
//
// The single write only holds if the sink passes it through untouched.
// `io::stdout()` is line buffered: a frame full of `\r\n` row breaks goes
// out up to the last newline, and the tail follows on `flush()`. Frames are
// therefore sent through `TtyWriter`, which hands each `write()` straight to
// `write(2)` on the stdout descriptor with no buffering in between.
#![allow(unsafe_code)]

use std::io::{self, Write};

/// A byte buffer that accumulates a frame for a single `write()`.
///
/// Default capacity: 16 KB, enough for a full screen of text plus
/// escapes on typical terminals without reallocation.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 16_384;

impl OutputBuffer {
    /// An empty frame buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Bytes queued for the next flush.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing is queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The queued frame bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append raw bytes.
    #[inline]
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append `n` copies of `byte`.
    #[inline]
    pub fn push_repeated(&mut self, byte: u8, n: usize) {
        self.buf.resize(self.buf.len() + n, byte);
    }

    /// Drop the queued bytes, keeping the allocation for the next frame.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write accumulated output to `w` in one call and clear the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to or flushing `w` fails. The buffer is
    /// cleared either way so a failed frame is never re-sent.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let result = w.write_all(&self.buf).and_then(|()| w.flush());
        self.buf.clear();
        result
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Frames leave through flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── TtyWriter ───────────────────────────────────────────────────────────────

/// Unbuffered writer on the process's stdout descriptor.
///
/// Every [`write`](Write::write) is exactly one `write(2)` call, and
/// [`flush`](Write::flush) has nothing to do. A frame flushed with
/// [`OutputBuffer::flush_to`] reaches the terminal in one system call
/// unless the kernel accepts it only partially.
#[derive(Debug)]
pub struct TtyWriter {
    #[cfg(unix)]
    fd: libc::c_int,
}

impl TtyWriter {
    /// A writer on stdout.
    #[must_use]
    pub const fn stdout() -> Self {
        Self {
            #[cfg(unix)]
            fd: libc::STDOUT_FILENO,
        }
    }
}

impl Default for TtyWriter {
    fn default() -> Self {
        Self::stdout()
    }
}

#[cfg(unix)]
impl Write for TtyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = unsafe { libc::write(self.fd, buf.as_ptr().cast(), buf.len()) };
        usize::try_from(n).map_err(|_| io::Error::last_os_error())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(not(unix))]
impl Write for TtyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(buf)?;
        stdout.flush()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
