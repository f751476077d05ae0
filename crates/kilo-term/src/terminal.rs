// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode, window size, and RAII cleanup.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ) and raw fd writes. These are the standard
// POSIX interfaces for terminal control; there is no safe alternative. Each
// unsafe block is minimal.
#![allow(unsafe_code)]
//
// The line discipline is process-wide state, so `RawSession` is the only
// thing allowed to touch it, and only one session may be live at a time.
// The original termios is kept in a global backup behind a `Mutex`. Whoever
// takes it out of the backup first (explicit release, `Drop`, or the panic
// hook) is the one who restores it, which makes the restore happen exactly
// once no matter which exit path gets there.
//
// The panic hook writes its screen reset straight to fd 1, bypassing Rust's
// stdout lock, so a panic in the middle of a frame write cannot deadlock.
//
// SIGTERM and SIGHUP get a handler too. It cannot take the `Mutex`, so it
// restores from a copy published once at snapshot time, then re-raises the
// signal with the default action. SIGINT and SIGQUIT never arrive while raw
// mode is on (ISIG is cleared). SIGKILL cannot be caught; after one, the
// shell's `reset` is the only way back.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(unix)]
use std::sync::OnceLock;
use std::sync::{Mutex, Once, PoisonError};

use tracing::{debug, warn};

use crate::ansi;
use crate::error::{Error, Result};
use crate::reader::ByteSource;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

// ─── Window Size ────────────────────────────────────────────────────────────

/// Longest cursor-position reply we are willing to buffer.
const REPLY_MAX: usize = 31;

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal, the query fails, or the
/// driver reports a zero dimension. Zero rows is rejected as well as zero
/// columns: a screen with no rows cannot show anything, so the probe gets a
/// chance to find a usable size instead.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &raw mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Determine the window size, falling back to a cursor-position probe.
///
/// # Errors
///
/// Returns [`Error::WindowSize`] if both the ioctl and the probe fail.
pub fn window_size(input: &mut impl ByteSource, out: &mut impl Write) -> Result<Size> {
    if let Some(size) = get_size() {
        debug!(rows = size.rows, cols = size.cols, "window size from TIOCGWINSZ");
        return Ok(size);
    }

    warn!("TIOCGWINSZ unavailable, probing cursor position");
    probe_size(input, out)
}

/// Infer the window size by parking the cursor in the bottom-right corner
/// and asking the terminal where it ended up.
///
/// Reads the reply up to the terminating `R`, a timeout, or
/// [`REPLY_MAX`] bytes, whichever comes first.
///
/// # Errors
///
/// Returns [`Error::WindowSize`] if the probe cannot be written or the
/// reply is missing or malformed.
pub fn probe_size(input: &mut impl ByteSource, out: &mut impl Write) -> Result<Size> {
    let sent = ansi::cursor_far(out)
        .and_then(|()| ansi::request_cursor_position(out))
        .and_then(|()| out.flush());
    if let Err(e) = sent {
        warn!(error = %e, "could not send cursor position probe");
        return Err(Error::WindowSize);
    }

    let mut reply = Vec::with_capacity(REPLY_MAX);
    while reply.len() < REPLY_MAX {
        match input.read_byte() {
            Ok(Some(b'R') | None) => break,
            Ok(Some(byte)) => reply.push(byte),
            Err(e) => {
                warn!(error = %e, "cursor position reply interrupted");
                break;
            }
        }
    }

    let size = ansi::parse_cursor_report(&reply).ok_or(Error::WindowSize)?;
    debug!(rows = size.rows, cols = size.cols, "window size from cursor probe");
    Ok(size)
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Set while a [`RawSession`] is alive.
static SESSION_ACTIVE: AtomicBool = AtomicBool::new(false);

/// The discipline to restore, present until somebody restores it.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Take the backup and write it back to the terminal.
///
/// Returns `Ok(false)` when the backup was already consumed.
#[cfg(unix)]
fn restore_from_backup() -> io::Result<bool> {
    restore_backup_to(libc::STDIN_FILENO)
}

/// Take the backup and apply it to `fd`.
///
/// The backup is consumed before `tcsetattr` runs, so a failed restore is
/// never attempted a second time.
#[cfg(unix)]
fn restore_backup_to(fd: libc::c_int) -> io::Result<bool> {
    let original = TERMIOS_BACKUP
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();

    let Some(original) = original else {
        return Ok(false);
    };

    if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const original) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(true)
}

#[cfg(not(unix))]
fn restore_from_backup() -> io::Result<bool> {
    Ok(false)
}

/// Screen reset written by the panic hook: show cursor, clear, home.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[?25h\x1b[2J\x1b[H";

/// Guard so the panic hook and signal handlers are installed once per process.
static EXIT_HOOKS_INSTALLED: Once = Once::new();

/// Install the panic hook and the exit-signal handlers.
///
/// Without the panic hook, a panic in raw mode leaves the shell with no echo
/// and no line editing, and the panic message itself is smeared across the
/// screen.
fn install_exit_hooks() {
    EXIT_HOOKS_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();
            let _ = restore_from_backup();
            original(info);
        }));
        install_signal_handlers();
    });
}

// ─── Exit Signals ───────────────────────────────────────────────────────────

/// The original discipline, readable from a signal handler.
///
/// Published on the first successful snapshot. Reading it is an atomic
/// load, unlike the backup `Mutex`.
#[cfg(unix)]
static SIGNAL_TERMIOS: OnceLock<libc::termios> = OnceLock::new();

/// Signals that end the process with the terminal still raw.
#[cfg(unix)]
const EXIT_SIGNALS: [libc::c_int; 2] = [libc::SIGTERM, libc::SIGHUP];

#[cfg(unix)]
fn install_signal_handlers() {
    for sig in EXIT_SIGNALS {
        unsafe {
            let mut sa: libc::sigaction = std::mem::zeroed();
            sa.sa_sigaction = exit_signal_handler as *const () as usize;
            sa.sa_flags = libc::SA_RESETHAND;
            libc::sigemptyset(&raw mut sa.sa_mask);
            libc::sigaction(sig, &raw const sa, std::ptr::null_mut());
        }
    }
}

#[cfg(not(unix))]
fn install_signal_handlers() {}

/// Restore the terminal, then die of `sig` with its default action.
///
/// Only async-signal-safe calls: `tcsetattr`, `write`, `raise`.
#[cfg(unix)]
extern "C" fn exit_signal_handler(sig: libc::c_int) {
    if SESSION_ACTIVE.load(Ordering::Acquire) {
        if let Some(original) = SIGNAL_TERMIOS.get() {
            unsafe {
                libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, std::ptr::from_ref(original));
            }
        }
        emergency_restore();
    }
    // SA_RESETHAND already put the default action back.
    unsafe {
        libc::raise(sig);
    }
}

/// Write [`EMERGENCY_RESTORE`] directly to stdout's file descriptor.
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Raw Mode ───────────────────────────────────────────────────────────────

/// Derive the raw-mode discipline from an original one.
///
/// Clears canonical mode, echo, signal keys and extended input processing;
/// disables output post-processing, flow control, CR→NL translation, break
/// signals, parity checking and bit stripping; sets 8-bit characters. Reads
/// return as soon as one byte is available, or after 100 ms with none.
#[cfg(unix)]
#[must_use]
pub fn make_raw(mut termios: libc::termios) -> libc::termios {
    termios.c_iflag &= !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
    termios.c_oflag &= !libc::OPOST;
    termios.c_cflag |= libc::CS8;
    termios.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);

    termios.c_cc[libc::VMIN] = 0;
    termios.c_cc[libc::VTIME] = 1;
    termios
}

// ─── RawSession ─────────────────────────────────────────────────────────────

/// Exclusive ownership of the terminal's line discipline.
///
/// [`acquire`](Self::acquire) snapshots the current discipline,
/// [`apply_raw_mode`](Self::apply_raw_mode) switches to raw input, and the
/// snapshot is written back exactly once: by [`release`](Self::release), by
/// `Drop`, or by the panic hook, whichever runs first.
///
/// # Example
///
/// ```no_run
/// use kilo_term::terminal::RawSession;
///
/// let session = RawSession::acquire()?;
/// session.apply_raw_mode()?;
/// // ... read keys, draw frames ...
/// session.release()?;
/// # Ok::<(), kilo_term::Error>(())
/// ```
pub struct RawSession {
    /// Discipline captured at acquisition, the base for raw mode.
    #[cfg(unix)]
    original: libc::termios,
}

impl RawSession {
    /// Snapshot the terminal discipline and take ownership of it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionActive`] if another session is alive, or
    /// [`Error::TerminalQuery`] if `tcgetattr` fails (e.g. stdin is not a
    /// terminal).
    pub fn acquire() -> Result<Self> {
        if SESSION_ACTIVE.swap(true, Ordering::AcqRel) {
            return Err(Error::SessionActive);
        }

        match Self::snapshot() {
            Ok(session) => {
                install_exit_hooks();
                debug!("terminal session acquired");
                Ok(session)
            }
            Err(e) => {
                SESSION_ACTIVE.store(false, Ordering::Release);
                Err(e)
            }
        }
    }

    #[cfg(unix)]
    fn snapshot() -> Result<Self> {
        let mut termios: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(libc::STDIN_FILENO, &raw mut termios) } != 0 {
            return Err(Error::TerminalQuery(io::Error::last_os_error()));
        }

        *TERMIOS_BACKUP
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(termios);
        let _ = SIGNAL_TERMIOS.set(termios);

        Ok(Self { original: termios })
    }

    #[cfg(not(unix))]
    fn snapshot() -> Result<Self> {
        Err(Error::TerminalQuery(io::Error::from(
            io::ErrorKind::Unsupported,
        )))
    }

    /// Switch the terminal to raw input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TerminalConfigure`] if `tcsetattr` fails.
    #[cfg(unix)]
    pub fn apply_raw_mode(&self) -> Result<()> {
        let raw = make_raw(self.original);
        if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const raw) } != 0 {
            return Err(Error::TerminalConfigure(io::Error::last_os_error()));
        }
        debug!("raw mode enabled");
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn apply_raw_mode(&self) -> Result<()> {
        Ok(())
    }

    /// Restore the original discipline and end the session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TerminalRestore`] if `tcsetattr` fails. The session
    /// is over either way; nothing retries the restore.
    pub fn release(self) -> Result<()> {
        let restored = restore_from_backup().map_err(Error::TerminalRestore)?;
        if restored {
            debug!("terminal session released");
        }
        Ok(())
    }
}

impl std::fmt::Debug for RawSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawSession").finish_non_exhaustive()
    }
}

impl Drop for RawSession {
    fn drop(&mut self) {
        if let Ok(true) = restore_from_backup() {
            debug!("terminal restored on drop");
        }
        SESSION_ACTIVE.store(false, Ordering::Release);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
