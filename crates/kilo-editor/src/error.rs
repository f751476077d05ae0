//! Editor errors.
//!
//! Terminal failures come up from `kilo-term` unchanged; file failures carry
//! the path so the binary's diagnostic names the file.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while starting or running the editor.
#[derive(Debug, Error)]
pub enum Error {
    /// A terminal, input, or output failure.
    #[error(transparent)]
    Term(#[from] kilo_term::Error),

    /// The file given on the command line could not be opened.
    #[error("fopen {}: {source}", .path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file opened but reading it failed part way.
    #[error("read {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result alias for the editor core.
pub type Result<T> = std::result::Result<T, Error>;
