// SPDX-License-Identifier: MIT
//
// Key decoder.
//
// Turns raw stdin bytes into logical keys: literal bytes (printable and
// control characters) and the handful of special keys terminals report as
// escape sequences:
//
// - CSI letter:     ESC [ A/B/C/D (arrows), ESC [ H / ESC [ F (Home/End)
// - CSI tilde:      ESC [ 1/7 ~ (Home), 3 ~ (Delete), 4/8 ~ (End),
//                   5 ~ (PageUp), 6 ~ (PageDown)
// - SS3:            ESC O H / ESC O F (Home/End)
//
// # Design
//
// Matching is a pure function, `decode`, over the bytes consumed so far.
// It either finishes a key or asks for one more byte; the longest sequence
// it ever looks at is four bytes. `read_key` is the thin I/O shell around
// it: spin until a first byte arrives, then feed `decode` until it is done.
//
// A lone ESC and a truncated sequence look the same once the byte source
// times out. Both become `Key::Escape`. Anything unrecognised also becomes
// `Key::Escape`; malformed input is never an error.

use tracing::trace;

use crate::error::{Error, Result};
use crate::reader::ByteSource;

/// The escape byte.
pub const ESC: u8 = 0x1B;

/// The byte a terminal sends for Ctrl + `key`.
#[inline]
#[must_use]
pub const fn ctrl(key: u8) -> u8 {
    key & 0x1F
}

// ─── Key ────────────────────────────────────────────────────────────────────

/// A decoded key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Any byte that did not start an escape sequence.
    Byte(u8),
    // ── Navigation ──────────────────────────────────────────────
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    // ── Editing ─────────────────────────────────────────────────
    Delete,
    /// A lone ESC, or an escape sequence we could not match.
    Escape,
}

// ─── Decoding ───────────────────────────────────────────────────────────────

/// Outcome of matching the bytes read so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// The bytes form a complete key.
    Key(Key),
    /// Another byte is needed before a key can be produced.
    NeedMore,
}

/// Match a prefix of a key's byte sequence.
///
/// `seq` holds every byte consumed for the current key, in order. The
/// result depends only on `seq`; feeding the same bytes always gives the
/// same answer.
#[must_use]
pub const fn decode(seq: &[u8]) -> Decoded {
    match *seq {
        [] | [ESC] | [ESC, _] => Decoded::NeedMore,
        [byte] => Decoded::Key(Key::Byte(byte)),

        [ESC, b'[', b'0'..=b'9'] => Decoded::NeedMore,
        [ESC, b'[', digit @ b'0'..=b'9', b'~', ..] => Decoded::Key(match digit {
            b'1' | b'7' => Key::Home,
            b'3' => Key::Delete,
            b'4' | b'8' => Key::End,
            b'5' => Key::PageUp,
            b'6' => Key::PageDown,
            _ => Key::Escape,
        }),
        [ESC, b'[', letter, ..] => Decoded::Key(match letter {
            b'A' => Key::Up,
            b'B' => Key::Down,
            b'C' => Key::Right,
            b'D' => Key::Left,
            b'H' => Key::Home,
            b'F' => Key::End,
            _ => Key::Escape,
        }),
        [ESC, b'O', b'H', ..] => Decoded::Key(Key::Home),
        [ESC, b'O', b'F', ..] => Decoded::Key(Key::End),
        _ => Decoded::Key(Key::Escape),
    }
}

/// Longest byte sequence [`decode`] can ask for.
const MAX_SEQ: usize = 4;

/// Block until one key has been read from `src`.
///
/// Timeouts before the first byte are retried indefinitely. A timeout in
/// the middle of an escape sequence yields [`Key::Escape`].
///
/// # Errors
///
/// Returns [`Error::InputRead`] if the source fails with anything other
/// than a timeout.
pub fn read_key(src: &mut impl ByteSource) -> Result<Key> {
    let mut seq = [0u8; MAX_SEQ];

    seq[0] = loop {
        if let Some(byte) = src.read_byte().map_err(Error::InputRead)? {
            break byte;
        }
    };

    let mut len = 1;
    loop {
        match decode(&seq[..len]) {
            Decoded::Key(key) => {
                trace!(?key, bytes = ?&seq[..len], "key decoded");
                return Ok(key);
            }
            Decoded::NeedMore if len == MAX_SEQ => return Ok(Key::Escape),
            Decoded::NeedMore => match src.read_byte().map_err(Error::InputRead)? {
                Some(byte) => {
                    seq[len] = byte;
                    len += 1;
                }
                None => return Ok(Key::Escape),
            },
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
