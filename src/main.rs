// SPDX-License-Identifier: MIT
//
// kilo — a minimal raw-mode terminal text viewer.
//
// Usage: `kilo [filename]`. Arrow keys, Home/End and PageUp/PageDown move
// the cursor; Ctrl-Q quits.
//
// This binary wires the two crates together:
//
//   kilo-term   → raw mode, window size, key decoding, frame output
//   kilo-editor → line buffer, cursor, viewport, the editor loop
//
// Startup order:
//
//   config → logging → RawSession → raw mode → window size → file → loop
//
// Logging comes first because it never touches the terminal. Every fatal
// error after the session is acquired clears the screen and restores the
// terminal before `kilo: <diagnostic>` reaches stderr.

mod config;

use std::fs::OpenOptions;
use std::io::Write;
use std::process;
use std::sync::Mutex;

use kilo_editor::editor::Editor;
use kilo_term::ansi;
use kilo_term::output::TtyWriter;
use kilo_term::reader::{ByteSource, TtyReader};
use kilo_term::terminal::{self, RawSession};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let config = Config::from_env();
    init_logging(&config);
    info!(version = VERSION, file = ?config.file, "kilo starting");

    // `run` has given the terminal back by the time it returns, so exiting
    // here never leaves it raw.
    let code = match run(&config) {
        Ok(()) => {
            info!("kilo exiting");
            0
        }
        Err(e) => {
            error!("{e}");
            eprintln!("kilo: {e}");
            1
        }
    };
    process::exit(code);
}

/// Install a file-backed subscriber when `KILO_LOG` is set.
///
/// stdout is the screen, so logs only ever go to a file.
fn init_logging(config: &Config) {
    let Some(path) = &config.log_file else {
        return;
    };

    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("kilo: cannot open log file {}: {e}", path.display());
            return;
        }
    };

    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Own the terminal for the lifetime of the editor.
fn run(config: &Config) -> kilo_editor::Result<()> {
    let session = RawSession::acquire()?;
    let mut out = TtyWriter::stdout();

    let outcome = session
        .apply_raw_mode()
        .map_err(kilo_editor::Error::from)
        .and_then(|()| edit(config, &mut TtyReader::new(), &mut out));

    conclude(outcome, &mut out, || session.release())
}

fn edit(
    config: &Config,
    input: &mut impl ByteSource,
    out: &mut impl Write,
) -> kilo_editor::Result<()> {
    let size = terminal::window_size(input, out)?;

    let mut editor = Editor::new(size);
    if let Some(path) = &config.file {
        editor.open(path)?;
    }
    editor.run(input, out)
}

/// Give the terminal back after an editing run.
///
/// A failed run leaves whatever frame was on screen, so it is cleared
/// first. The terminal is restored before the outcome is returned; on the
/// failure path a restore error is logged and the run's error wins.
fn conclude(
    outcome: kilo_editor::Result<()>,
    out: &mut impl Write,
    release: impl FnOnce() -> kilo_term::Result<()>,
) -> kilo_editor::Result<()> {
    match outcome {
        Ok(()) => Ok(release()?),
        Err(e) => {
            // Best effort: the screen may be what failed.
            let _ = ansi::clear_screen(out)
                .and_then(|()| ansi::cursor_home(out))
                .and_then(|()| out.flush());
            if let Err(restore) = release() {
                error!("{restore}");
            }
            Err(e)
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
