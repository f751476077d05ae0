//! Cursor — logical position and one-step movement.
//!
//! `CursorState` holds the cursor in buffer coordinates (`row` is an
//! absolute line index, not a screen row) together with `row_offset`, the
//! first buffer line shown at the top of the viewport. Scrolling keeps the
//! two consistent; see [`view::compute_scroll`](crate::view::compute_scroll).
//!
//! # Bounds
//!
//! Vertical movement is bounded by the buffer: the cursor may sit on any
//! line or one past the last (`row ∈ [0, len]`). Horizontal movement is
//! bounded by the *screen* (`col ∈ [0, cols - 1]`), not by the length of
//! the current line. Nothing tracks per-line width, so the cursor is free
//! to sit past the end of a short line.

/// A unit cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Cursor position and vertical scroll offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorState {
    /// Column on screen and in the line (0-indexed).
    pub col: usize,
    /// Buffer line index (0-indexed; `len` means "past the last line").
    pub row: usize,
    /// First buffer line visible at the top of the screen.
    pub row_offset: usize,
}

impl CursorState {
    /// Cursor at the origin, unscrolled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            col: 0,
            row: 0,
            row_offset: 0,
        }
    }

    /// Move one unit in `dir`, clamped.
    ///
    /// Up and Left stop at 0, Down stops at `line_count`, Right stops at
    /// `screen_cols - 1`.
    pub const fn step(&mut self, dir: Direction, line_count: usize, screen_cols: usize) {
        match dir {
            Direction::Left => {
                if self.col > 0 {
                    self.col -= 1;
                }
            }
            Direction::Right => {
                if self.col + 1 < screen_cols {
                    self.col += 1;
                }
            }
            Direction::Up => {
                if self.row > 0 {
                    self.row -= 1;
                }
            }
            Direction::Down => {
                if self.row < line_count {
                    self.row += 1;
                }
            }
        }
    }

    /// Jump to the first column.
    pub const fn line_start(&mut self) {
        self.col = 0;
    }

    /// Jump to the last screen column.
    pub const fn line_end(&mut self, screen_cols: usize) {
        self.col = screen_cols.saturating_sub(1);
    }

    /// Cursor position relative to the top-left of the screen, `(col, row)`.
    ///
    /// Only meaningful after scrolling has put `row` inside the viewport.
    #[must_use]
    pub const fn screen_position(&self) -> (usize, usize) {
        (self.col, self.row.saturating_sub(self.row_offset))
    }
}
