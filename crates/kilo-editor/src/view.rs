//! View — scrolling and frame rendering.
//!
//! The view maps the [`LineBuffer`] onto the screen. It holds no state of
//! its own: the scroll offset lives in [`CursorState`] and the screen size
//! comes from the terminal, so both functions here are pure transformations
//! of their arguments.
//!
//! A frame looks like this:
//!
//! ```text
//! ESC[?25l  ESC[H                       hide cursor, home
//! <line or ~> ESC[K \r\n                 one per screen row ...
//! <line or ~> ESC[K                      ... the last without \r\n
//! ESC[{row};{col}H  ESC[?25h            place and show cursor
//! ```
//!
//! The last row never ends in `\r\n`: a newline on the bottom row would
//! scroll the physical terminal by one line.

use std::io;

use kilo_term::ansi;
use kilo_term::output::OutputBuffer;
use kilo_term::terminal::Size;

use crate::buffer::LineBuffer;
use crate::cursor::CursorState;

/// Version shown in the welcome banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Placeholder drawn on screen rows past the end of the buffer.
const PLACEHOLDER: u8 = b'~';

/// The welcome banner shown over an empty buffer.
#[must_use]
pub fn welcome_message() -> String {
    format!("Kilo editor -- version {VERSION}")
}

// ---------------------------------------------------------------------------
// Scrolling
// ---------------------------------------------------------------------------

/// The row offset that brings `row` into a viewport of `screen_rows` lines.
///
/// Scrolls up just far enough if `row` is above the viewport, down just far
/// enough if it is below, and leaves the offset alone otherwise. Applying
/// it twice gives the same result as applying it once.
#[must_use]
pub const fn compute_scroll(row: usize, row_offset: usize, screen_rows: usize) -> usize {
    if row < row_offset {
        row
    } else if row >= row_offset + screen_rows {
        (row + 1).saturating_sub(screen_rows)
    } else {
        row_offset
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Append a full frame for `buffer` at `cursor` to `out`.
///
/// `cursor.row_offset` is taken as-is; run [`compute_scroll`] first.
///
/// # Errors
///
/// Propagates write errors from `out`, which never occur for an
/// in-memory [`OutputBuffer`].
pub fn render(
    buffer: &LineBuffer,
    cursor: &CursorState,
    size: Size,
    out: &mut OutputBuffer,
) -> io::Result<()> {
    ansi::cursor_hide(out)?;
    ansi::cursor_home(out)?;

    draw_rows(buffer, cursor.row_offset, size, out)?;

    let (x, y) = cursor.screen_position();
    ansi::cursor_to(out, x, y)?;
    ansi::cursor_show(out)
}

fn draw_rows(
    buffer: &LineBuffer,
    row_offset: usize,
    size: Size,
    out: &mut OutputBuffer,
) -> io::Result<()> {
    let rows = usize::from(size.rows);
    let cols = usize::from(size.cols);

    for y in 0..rows {
        match buffer.line(y + row_offset) {
            Some(line) => {
                let text = line.as_bytes();
                out.push_bytes(&text[..text.len().min(cols)]);
            }
            None if buffer.is_empty() && y == rows / 3 => draw_welcome(cols, out),
            None => out.push_bytes(&[PLACEHOLDER]),
        }

        ansi::clear_line(out)?;
        if y + 1 < rows {
            out.push_bytes(b"\r\n");
        }
    }

    Ok(())
}

/// Centre the banner in `cols` columns, keeping the placeholder in column 0.
fn draw_welcome(cols: usize, out: &mut OutputBuffer) {
    let message = welcome_message();
    let len = message.len().min(cols);

    let mut padding = (cols - len) / 2;
    if padding > 0 {
        out.push_bytes(&[PLACEHOLDER]);
        padding -= 1;
    }
    out.push_repeated(b' ', padding);
    out.push_bytes(&message.as_bytes()[..len]);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
