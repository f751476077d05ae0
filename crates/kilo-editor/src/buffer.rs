//! Line buffer — the file as a list of byte lines.
//!
//! A `LineBuffer` is built once from a file and never edited afterwards.
//! Each `Line` owns its bytes with the line terminator removed.
//!
//! # Design choices
//!
//! - **Bytes, not `str`.** The viewer draws whatever the file contains and
//!   truncates by byte count, so there is no reason to reject non-UTF-8
//!   files. Lengths are tracked by the `Vec`, so embedded NUL bytes are
//!   ordinary content.
//!
//! - **One terminator per line.** A line ends at `\n`; a single `\r` right
//!   before it is also dropped, so `\r\n` files read the same as `\n` files.
//!   Any other `\r` stays in the line. A last line with no `\n` is kept as-is.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Line
// ---------------------------------------------------------------------------

/// One line of text without its terminator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    bytes: Vec<u8>,
}

impl Line {
    /// Wrap bytes that are already free of a line terminator.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// The line's content.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the line has no content.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Drop a trailing `\n` and, only if one was there, a `\r` before it.
fn strip_terminator(mut raw: Vec<u8>) -> Vec<u8> {
    if raw.last() == Some(&b'\n') {
        raw.pop();
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
    }
    raw
}

// ---------------------------------------------------------------------------
// LineBuffer
// ---------------------------------------------------------------------------

/// The lines of a file, in file order.
///
/// Valid indices are exactly `0..len()`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineBuffer {
    lines: Vec<Line>,
}

impl LineBuffer {
    /// An empty buffer (no file loaded).
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Load every line of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileOpen`] if the file cannot be opened, or
    /// [`Error::FileRead`] if reading fails after that.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;

        let buffer = Self::from_reader(BufReader::new(file)).map_err(|source| Error::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), lines = buffer.len(), "file loaded");
        Ok(buffer)
    }

    /// Read lines from any buffered reader until end of input.
    ///
    /// # Errors
    ///
    /// Returns the reader's error if a read fails.
    pub fn from_reader(mut reader: impl BufRead) -> io::Result<Self> {
        let mut buffer = Self::new();
        loop {
            let mut raw = Vec::new();
            if reader.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            buffer.append(Line::new(strip_terminator(raw)));
        }
        Ok(buffer)
    }

    fn append(&mut self, line: Line) {
        self.lines.push(line);
    }

    /// Number of lines.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether no lines are loaded.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The line at `index`, if it exists.
    #[inline]
    #[must_use]
    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    /// Iterate over the lines in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Line> {
        self.lines.iter()
    }
}

impl<'a> IntoIterator for &'a LineBuffer {
    type Item = &'a Line;
    type IntoIter = std::slice::Iter<'a, Line>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::PathBuf;

    fn read(text: &[u8]) -> LineBuffer {
        LineBuffer::from_reader(text).unwrap()
    }

    fn contents(buf: &LineBuffer) -> Vec<String> {
        buf.iter()
            .map(|line| String::from_utf8_lossy(line.as_bytes()).into_owned())
            .collect()
    }

    fn temp_file(name: &str, data: &[u8]) -> PathBuf {
        let dir = std::env::temp_dir().join("kilo_editor_test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, data).unwrap();
        path
    }

    // -- Line ---------------------------------------------------------------

    #[test]
    fn line_tracks_length_with_embedded_nul() {
        let line = Line::new(b"a\0b".to_vec());
        assert_eq!(line.len(), 3);
        assert_eq!(line.as_bytes(), b"a\0b");
        assert!(!line.is_empty());
        assert!(Line::default().is_empty());
    }

    // -- Splitting ----------------------------------------------------------

    #[test]
    fn empty_input_has_no_lines() {
        let buf = read(b"");
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn lf_lines() {
        let buf = read(b"one\ntwo\nthree\n");
        assert_eq!(contents(&buf), vec!["one", "two", "three"]);
    }

    #[test]
    fn crlf_lines() {
        let buf = read(b"one\r\ntwo\r\nthree\r\n");
        assert_eq!(contents(&buf), vec!["one", "two", "three"]);
    }

    #[test]
    fn last_line_without_newline() {
        let buf = read(b"one\ntwo");
        assert_eq!(contents(&buf), vec!["one", "two"]);
    }

    #[test]
    fn blank_lines_are_kept() {
        let buf = read(b"\n\nx\n\n");
        assert_eq!(contents(&buf), vec!["", "", "x", ""]);
    }

    #[test]
    fn only_one_terminator_removed() {
        let buf = read(b"a\r\r\nb\n");
        assert_eq!(contents(&buf), vec!["a\r", "b"]);
    }

    #[test]
    fn lone_cr_is_content() {
        let buf = read(b"a\rb\nc\r");
        assert_eq!(contents(&buf), vec!["a\rb", "c\r"]);
    }

    #[test]
    fn non_utf8_bytes_survive() {
        let buf = read(b"\xff\xfe\n");
        assert_eq!(buf.line(0).unwrap().as_bytes(), b"\xff\xfe");
    }

    #[test]
    fn line_index_bounds() {
        let buf = read(b"a\nb\n");
        assert!(buf.line(0).is_some());
        assert!(buf.line(1).is_some());
        assert!(buf.line(2).is_none());
    }

    #[test]
    fn into_iter_by_ref() {
        let buf = read(b"x\ny\n");
        let mut n = 0;
        for line in &buf {
            assert_eq!(line.len(), 1);
            n += 1;
        }
        assert_eq!(n, 2);
    }

    // -- Files --------------------------------------------------------------

    #[test]
    fn load_lf_file() {
        let lines: Vec<String> = (0..50).map(|i| format!("line {i}")).collect();
        let mut data = lines.join("\n");
        data.push('\n');
        let path = temp_file("lf.txt", data.as_bytes());

        let buf = LineBuffer::load(&path).unwrap();
        assert_eq!(buf.len(), 50);
        for (i, expected) in lines.iter().enumerate() {
            assert_eq!(buf.line(i).unwrap().as_bytes(), expected.as_bytes());
        }
    }

    #[test]
    fn load_crlf_file() {
        let path = temp_file("crlf.txt", b"alpha\r\nbeta\r\ngamma");
        let buf = LineBuffer::load(&path).unwrap();
        assert_eq!(contents(&buf), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn load_missing_file_is_open_error() {
        let path = Path::new("/nonexistent/kilo/file.txt");
        let err = LineBuffer::load(path).unwrap_err();
        match err {
            Error::FileOpen { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected FileOpen, got {other:?}"),
        }
    }
}
