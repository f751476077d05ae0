// SPDX-License-Identifier: MIT
//
// kilo-term — Terminal layer for kilo.
//
// Everything that touches the terminal device lives here: the raw-mode
// session that borrows the line discipline for the life of the process,
// the window-size query, the byte sources the key decoder reads from,
// the decoder itself, and the output buffer that lets a whole frame go
// out in a single write.
//
// Like its sibling crates, this one talks to the terminal directly via
// termios and ANSI escape sequences rather than through a TUI framework.
// The protocol surface is tiny (clear, home, hide/show cursor, position,
// clear-line) and every byte of it is spelled out in `ansi`.

pub mod ansi;
pub mod error;
pub mod input;
pub mod output;
pub mod reader;
pub mod terminal;

pub use error::{Error, Result};
