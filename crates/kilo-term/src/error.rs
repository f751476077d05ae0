// SPDX-License-Identifier: MIT
//
// Terminal error taxonomy.
//
// Every variant is fatal for the viewer: there is no retry path for a
// terminal that refuses to be configured or a stdin that stops working.
// The wrapped `io::Error` is kept as the source so the binary can print
// the errno text next to the failing call.

use std::io;

use thiserror::Error;

/// Errors raised by the terminal layer.
#[derive(Debug, Error)]
pub enum Error {
    /// `tcgetattr` failed while snapshotting the line discipline.
    #[error("tcgetattr: {0}")]
    TerminalQuery(#[source] io::Error),

    /// `tcsetattr` failed while switching to raw mode.
    #[error("tcsetattr: {0}")]
    TerminalConfigure(#[source] io::Error),

    /// `tcsetattr` failed while putting the original discipline back.
    #[error("failed to restore terminal: {0}")]
    TerminalRestore(#[source] io::Error),

    /// Neither `TIOCGWINSZ` nor the cursor-position probe produced a size.
    #[error("getWindowSize: could not determine terminal dimensions")]
    WindowSize,

    /// Reading stdin failed with something other than a timeout.
    #[error("read: {0}")]
    InputRead(#[source] io::Error),

    /// Writing a frame or control sequence to the terminal failed.
    #[error("write: {0}")]
    Output(#[source] io::Error),

    /// A raw session is already live in this process.
    #[error("terminal session already active")]
    SessionActive,
}

/// Result alias for the terminal layer.
pub type Result<T> = std::result::Result<T, Error>;
