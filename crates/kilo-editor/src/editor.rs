//! Editor — the main loop tying terminal, buffer and view together.
//!
//! The editor moves through three states:
//!
//! ```text
//! Starting ──run()──▶ Running ──Ctrl-Q──▶ Quitting
//! ```
//!
//! While starting, the caller loads a file with [`Editor::open`]. Running is
//! a loop of scroll → render → read one key → react. Quitting clears the
//! screen and homes the cursor; releasing the terminal is left to whoever
//! owns the [`RawSession`](kilo_term::terminal::RawSession).
//!
//! The loop is generic over its byte source and output writer, so the whole
//! thing runs in tests against scripted input and a `Vec<u8>` screen.

use std::io::Write;
use std::path::Path;

use kilo_term::ansi;
use kilo_term::input::{self, Key};
use kilo_term::output::OutputBuffer;
use kilo_term::reader::ByteSource;
use kilo_term::terminal::Size;
use tracing::{debug, info};

use crate::buffer::LineBuffer;
use crate::cursor::{CursorState, Direction};
use crate::error::Result;
use crate::view;

/// The key that quits: Ctrl-Q.
pub const QUIT_KEY: u8 = input::ctrl(b'q');

/// Lifecycle of an editor session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Created, file possibly loaded, loop not yet entered.
    Starting,
    /// Drawing frames and reading keys.
    Running,
    /// Quit key received; the screen has been cleared.
    Quitting,
}

/// What the loop should do after a key has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep running.
    Continue,
    /// Leave the loop.
    Quit,
}

/// Viewer state: the loaded lines, the cursor, and the screen they map onto.
#[derive(Debug)]
pub struct Editor {
    buffer: LineBuffer,
    cursor: CursorState,
    size: Size,
    state: State,
    frame: OutputBuffer,
}

impl Editor {
    /// An editor with an empty buffer for a screen of `size`.
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            buffer: LineBuffer::new(),
            cursor: CursorState::new(),
            size,
            state: State::Starting,
            frame: OutputBuffer::new(),
        }
    }

    /// Load `path` into the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileOpen`](crate::Error::FileOpen) or
    /// [`Error::FileRead`](crate::Error::FileRead) from loading.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        self.buffer = LineBuffer::load(path)?;
        Ok(())
    }

    // -- Accessors ----------------------------------------------------------

    /// The loaded lines.
    #[inline]
    #[must_use]
    pub const fn buffer(&self) -> &LineBuffer {
        &self.buffer
    }

    /// Cursor and scroll offset.
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> &CursorState {
        &self.cursor
    }

    /// Screen dimensions.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    // -- Loop ---------------------------------------------------------------

    /// Run until the quit key is read.
    ///
    /// On return the editor is [`State::Quitting`] and the screen has been
    /// cleared.
    ///
    /// # Errors
    ///
    /// Returns input read failures and output write failures. The editor
    /// stays [`State::Running`] in that case.
    pub fn run(&mut self, input: &mut impl ByteSource, out: &mut impl Write) -> Result<()> {
        self.state = State::Running;
        info!(
            lines = self.buffer.len(),
            rows = self.size.rows,
            cols = self.size.cols,
            "editor running"
        );

        loop {
            self.refresh_screen(out)?;
            let key = input::read_key(input)?;
            if self.process_key(key) == Action::Quit {
                break;
            }
        }

        self.quit(out)
    }

    /// Scroll the cursor into view and write one frame to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`kilo_term::Error::Output`] if the write fails.
    pub fn refresh_screen(&mut self, out: &mut impl Write) -> Result<()> {
        self.scroll();

        self.frame.clear();
        view::render(&self.buffer, &self.cursor, self.size, &mut self.frame)
            .map_err(kilo_term::Error::Output)?;
        self.frame
            .flush_to(out)
            .map_err(kilo_term::Error::Output)?;
        Ok(())
    }

    /// Keep `row_offset` consistent with the cursor row.
    pub fn scroll(&mut self) {
        self.cursor.row_offset = view::compute_scroll(
            self.cursor.row,
            self.cursor.row_offset,
            usize::from(self.size.rows),
        );
    }

    /// React to one key.
    pub fn process_key(&mut self, key: Key) -> Action {
        let cols = usize::from(self.size.cols);

        match key {
            Key::Byte(QUIT_KEY) => return Action::Quit,
            Key::Home => self.cursor.line_start(),
            Key::End => self.cursor.line_end(cols),
            Key::PageUp | Key::PageDown => {
                let dir = if key == Key::PageUp {
                    Direction::Up
                } else {
                    Direction::Down
                };
                for _ in 0..self.size.rows {
                    self.move_cursor(dir);
                }
            }
            Key::Up => self.move_cursor(Direction::Up),
            Key::Down => self.move_cursor(Direction::Down),
            Key::Left => self.move_cursor(Direction::Left),
            Key::Right => self.move_cursor(Direction::Right),
            Key::Byte(_) | Key::Delete | Key::Escape => {}
        }

        Action::Continue
    }

    fn move_cursor(&mut self, dir: Direction) {
        self.cursor
            .step(dir, self.buffer.len(), usize::from(self.size.cols));
    }

    fn quit(&mut self, out: &mut impl Write) -> Result<()> {
        self.state = State::Quitting;
        debug!("quit key received");

        ansi::clear_screen(&mut self.frame).map_err(kilo_term::Error::Output)?;
        ansi::cursor_home(&mut self.frame).map_err(kilo_term::Error::Output)?;
        self.frame
            .flush_to(out)
            .map_err(kilo_term::Error::Output)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;

    use super::*;
    use crate::Error;
    use pretty_assertions::assert_eq;

    const SCREEN: Size = Size { cols: 80, rows: 24 };

    fn editor_with_lines(n: usize) -> Editor {
        let text: String = (0..n).map(|i| format!("line {i}\n")).collect();
        let mut e = Editor::new(SCREEN);
        e.buffer = LineBuffer::from_reader(text.as_bytes()).unwrap();
        e
    }

    fn feed(e: &mut Editor, keys: &[Key]) {
        for &key in keys {
            assert_eq!(e.process_key(key), Action::Continue);
            e.scroll();
        }
    }

    fn scripted(bytes: &[u8]) -> VecDeque<u8> {
        bytes.iter().copied().collect()
    }

    /// Tiny deterministic generator for movement sequences.
    struct Lcg(u64);

    impl Lcg {
        fn next_u64(&mut self) -> u64 {
            self.0 = self.0.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            self.0 >> 33
        }
    }

    // -- Construction -------------------------------------------------------

    #[test]
    fn new_editor_is_starting_and_empty() {
        let e = Editor::new(SCREEN);
        assert_eq!(e.state(), State::Starting);
        assert!(e.buffer().is_empty());
        assert_eq!(*e.cursor(), CursorState::new());
        assert_eq!(e.size(), SCREEN);
    }

    #[test]
    fn open_missing_file_fails() {
        let mut e = Editor::new(SCREEN);
        let err = e.open(Path::new("/nonexistent/kilo.txt")).unwrap_err();
        assert!(matches!(err, Error::FileOpen { .. }));
    }

    #[test]
    fn open_loads_lines() {
        let dir = std::env::temp_dir().join("kilo_editor_open_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("three.txt");
        std::fs::write(&path, "a\nb\nc\n").unwrap();

        let mut e = Editor::new(SCREEN);
        e.open(&path).unwrap();
        assert_eq!(e.buffer().len(), 3);
    }

    // -- Movement -----------------------------------------------------------

    #[test]
    fn arrow_up_at_top_is_clamped() {
        let mut e = editor_with_lines(10);
        feed(&mut e, &[Key::Up]);
        assert_eq!(e.cursor().row, 0);
    }

    #[test]
    fn arrows_move_one_unit() {
        let mut e = editor_with_lines(10);
        feed(&mut e, &[Key::Down, Key::Down, Key::Right, Key::Right, Key::Right]);
        assert_eq!((e.cursor().col, e.cursor().row), (3, 2));
        feed(&mut e, &[Key::Up, Key::Left]);
        assert_eq!((e.cursor().col, e.cursor().row), (2, 1));
    }

    #[test]
    fn down_stops_past_last_line() {
        let mut e = editor_with_lines(3);
        feed(&mut e, &[Key::Down; 10]);
        assert_eq!(e.cursor().row, 3);
    }

    #[test]
    fn right_bounded_by_screen_not_line() {
        // Lines are 6 bytes wide; the cursor still reaches the screen edge.
        let mut e = editor_with_lines(1);
        feed(&mut e, &[Key::Right; 200]);
        assert_eq!(e.cursor().col, 79);
    }

    #[test]
    fn home_and_end_keys() {
        let mut e = editor_with_lines(1);
        feed(&mut e, &[Key::End]);
        assert_eq!(e.cursor().col, 79);
        feed(&mut e, &[Key::Home]);
        assert_eq!(e.cursor().col, 0);
    }

    #[test]
    fn page_down_moves_a_screen_and_scrolls() {
        let mut e = editor_with_lines(100);
        e.cursor = CursorState {
            col: 0,
            row: 50,
            row_offset: 40,
        };
        feed(&mut e, &[Key::PageDown]);
        assert_eq!(e.cursor().row, 74);
        assert_eq!(e.cursor().row_offset, 51);
    }

    #[test]
    fn page_up_moves_a_screen_and_scrolls() {
        let mut e = editor_with_lines(100);
        e.cursor = CursorState {
            col: 0,
            row: 74,
            row_offset: 51,
        };
        feed(&mut e, &[Key::PageUp]);
        assert_eq!(e.cursor().row, 50);
        assert_eq!(e.cursor().row_offset, 50);
    }

    #[test]
    fn page_up_clamps_at_top() {
        let mut e = editor_with_lines(100);
        feed(&mut e, &[Key::Down; 5]);
        feed(&mut e, &[Key::PageUp]);
        assert_eq!(e.cursor().row, 0);
    }

    #[test]
    fn other_keys_are_ignored() {
        let mut e = editor_with_lines(5);
        feed(&mut e, &[Key::Down, Key::Right]);
        let before = *e.cursor();
        feed(
            &mut e,
            &[Key::Byte(b'x'), Key::Byte(b'\r'), Key::Delete, Key::Escape],
        );
        assert_eq!(*e.cursor(), before);
    }

    #[test]
    fn quit_key_is_ctrl_q() {
        let mut e = Editor::new(SCREEN);
        assert_eq!(QUIT_KEY, 0x11);
        assert_eq!(e.process_key(Key::Byte(QUIT_KEY)), Action::Quit);
        assert_eq!(e.process_key(Key::Byte(b'q')), Action::Continue);
    }

    #[test]
    fn scroll_invariant_holds_after_random_movement() {
        let keys = [
            Key::Up,
            Key::Down,
            Key::Left,
            Key::Right,
            Key::PageUp,
            Key::PageDown,
            Key::Home,
            Key::End,
        ];
        let mut rng = Lcg(0x5eed);

        for n in [0, 1, 23, 24, 25, 100] {
            let mut e = editor_with_lines(n);
            for _ in 0..2_000 {
                #[allow(clippy::cast_possible_truncation)]
                let key = keys[(rng.next_u64() % keys.len() as u64) as usize];
                feed(&mut e, &[key]);

                let c = e.cursor();
                assert!(c.row <= n, "row {} past buffer of {n}", c.row);
                assert!(c.row_offset <= n);
                assert!(c.row_offset <= c.row && c.row <= c.row_offset + 24);
                assert!(c.col < 80);
            }
        }
    }

    // -- Frames -------------------------------------------------------------

    #[test]
    fn refresh_writes_scrolled_frame_once() {
        let mut e = editor_with_lines(100);
        e.cursor.row = 30;
        let mut out = Vec::new();
        e.refresh_screen(&mut out).unwrap();

        assert_eq!(e.cursor().row_offset, 7);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\x1b[?25l\x1b[Hline 7\x1b[K\r\n"));
        assert!(text.ends_with("\x1b[24;1H\x1b[?25h"));
    }

    // -- Whole loop ---------------------------------------------------------

    #[test]
    fn quit_chord_ends_loop_and_clears_screen() {
        let mut e = Editor::new(SCREEN);
        let mut input = scripted(&[QUIT_KEY]);
        let mut out = Vec::new();

        e.run(&mut input, &mut out).unwrap();

        assert_eq!(e.state(), State::Quitting);
        assert!(out.ends_with(b"\x1b[2J\x1b[H"));
        assert!(String::from_utf8_lossy(&out).contains("Kilo editor -- version"));
    }

    #[test]
    fn loop_applies_keys_in_order() {
        let mut e = editor_with_lines(50);
        let mut input = scripted(b"\x1b[B\x1b[B\x1b[C\x1b[6~x\x11");
        let mut out = Vec::new();

        e.run(&mut input, &mut out).unwrap();

        assert_eq!(e.cursor().row, 26);
        assert_eq!(e.cursor().col, 1);
        assert!(input.is_empty());
    }

    #[test]
    fn loop_draws_a_frame_per_key() {
        let mut e = editor_with_lines(5);
        let mut input = scripted(b"ab\x11");
        let mut out = Vec::new();

        e.run(&mut input, &mut out).unwrap();

        let frames = String::from_utf8(out).unwrap().matches("\x1b[?25l").count();
        assert_eq!(frames, 3);
    }

    #[test]
    fn input_failure_stops_loop() {
        struct Broken;

        impl ByteSource for Broken {
            fn read_byte(&mut self) -> io::Result<Option<u8>> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }
        }

        let mut e = Editor::new(SCREEN);
        let err = e.run(&mut Broken, &mut Vec::new()).unwrap_err();

        assert!(matches!(err, Error::Term(kilo_term::Error::InputRead(_))));
        assert_eq!(e.state(), State::Running);
    }

    #[test]
    fn output_failure_stops_loop() {
        struct Closed;

        impl Write for Closed {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut e = Editor::new(SCREEN);
        let err = e.run(&mut scripted(&[QUIT_KEY]), &mut Closed).unwrap_err();
        assert!(matches!(err, Error::Term(kilo_term::Error::Output(_))));
    }
}
