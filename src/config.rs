// SPDX-License-Identifier: MIT
//
// Startup configuration from the command line and environment.
//
//   kilo [filename]
//
//   KILO_LOG=<path>          write logs to <path> (off when unset or empty)
//   KILO_LOG_LEVEL=<filter>  tracing filter directive, default "info"
//
// Only the first positional argument is used; anything after it is ignored.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// Log file path variable.
pub const LOG_FILE_VAR: &str = "KILO_LOG";

/// Log filter variable.
pub const LOG_LEVEL_VAR: &str = "KILO_LOG_LEVEL";

/// Filter used when `KILO_LOG_LEVEL` is unset or not valid UTF-8.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Everything the binary needs to know before touching the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// File to view; `None` opens an empty buffer.
    pub file: Option<PathBuf>,
    /// Where to write logs; `None` disables logging.
    pub log_file: Option<PathBuf>,
    /// `EnvFilter` directive for the log subscriber.
    pub log_filter: String,
}

impl Config {
    /// Read the process arguments and environment.
    pub fn from_env() -> Self {
        Self::parse(env::args_os().skip(1), |name| env::var_os(name))
    }

    /// Build a config from `args` (program name already removed) and a
    /// variable lookup.
    pub fn parse<I, F>(args: I, var: F) -> Self
    where
        I: IntoIterator<Item = OsString>,
        F: Fn(&str) -> Option<OsString>,
    {
        let file = args.into_iter().next().map(PathBuf::from);

        let log_file = var(LOG_FILE_VAR)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        let log_filter = var(LOG_LEVEL_VAR)
            .and_then(|level| level.into_string().ok())
            .filter(|level| !level.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Self {
            file,
            log_file,
            log_filter,
        }
    }
}
