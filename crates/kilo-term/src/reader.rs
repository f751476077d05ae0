// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Byte sources — where the key decoder gets its input.
//
// In raw mode with VMIN=0 / VTIME=1, a `read()` on stdin returns after at
// most 100 ms, with either one byte or nothing. "Nothing" is the normal idle
// state, not an error, and the key decoder relies on it to tell a lone Escape
// press apart from the start of an escape sequence. `ByteSource` encodes that
// three-way outcome in its signature: a byte, a timeout, or a real failure.
//
// The timeout case has to be recognised by errno, not by the shape of the
// return value: some platforms report an empty VTIME read as `-1 / EAGAIN`
// rather than `0`.

use std::collections::VecDeque;
use std::io;

/// A source of single bytes with a bounded wait.
pub trait ByteSource {
    /// Read one byte.
    ///
    /// Returns `Ok(None)` when no byte arrived before the source's timeout.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error for any failure other than a
    /// timeout.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Scripted input: bytes are handed out front to back, and an empty queue
/// reads as a timeout.
impl ByteSource for VecDeque<u8> {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.pop_front())
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }
}

/// Stdin of a terminal in raw mode.
///
/// Each [`read_byte`](ByteSource::read_byte) is a single one-byte `read()`
/// on the stdin file descriptor, so the wait is whatever `VTIME` the
/// [`RawSession`](crate::terminal::RawSession) configured.
#[derive(Debug, Default)]
pub struct TtyReader {
    _private: (),
}

impl TtyReader {
    /// Create a reader over the process's stdin.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

/// Whether a failed read only means "nothing arrived yet".
fn is_idle(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

#[cfg(unix)]
impl ByteSource for TtyReader {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = 0u8;
        let n = unsafe { libc::read(libc::STDIN_FILENO, (&raw mut byte).cast(), 1) };

        match n {
            1 => Ok(Some(byte)),
            0 => Ok(None),
            _ => {
                let err = io::Error::last_os_error();
                if is_idle(&err) { Ok(None) } else { Err(err) }
            }
        }
    }
}

#[cfg(not(unix))]
impl ByteSource for TtyReader {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        use std::io::Read;

        let mut buf = [0u8; 1];
        match io::stdin().lock().read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if is_idle(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
