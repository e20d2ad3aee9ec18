//! Tracing subscriber setup for both commands.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_stderr() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter())
        .init();
}

/// Log to `path`, appending. Used while the terminal belongs to the chart.
///
/// If the file cannot be opened nothing is logged at all rather than
/// scribbling over the chart; the failure is returned so the caller can
/// report it once the terminal is restored.
pub fn init_file(path: &Path) -> io::Result<()> {
    match open_log(path) {
        Ok(file) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(env_filter())
                .init();
            tracing::info!(path = %path.display(), "logging initialized");
            Ok(())
        }
        Err(e) => {
            tracing_subscriber::registry().with(env_filter()).init();
            Err(e)
        }
    }
}

fn open_log(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
