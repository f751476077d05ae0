//! # kilo-editor — Editor core for kilo
//!
//! This crate holds everything between the terminal layer and the binary:
//!
//! - **[`buffer`]** — `Line` and `LineBuffer`, the file contents as raw bytes
//! - **[`cursor`]** — `CursorState` (column, row, row offset) and clamped movement
//! - **[`view`]** — scroll adjustment and frame rendering into an output buffer
//! - **[`editor`]** — the `Editor` state machine: render, read a key, react
//! - **[`error`]** — the editor-level error type wrapping terminal failures

pub mod buffer;
pub mod cursor;
pub mod editor;
pub mod error;
pub mod view;

pub use error::{Error, Result};
