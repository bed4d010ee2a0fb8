use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::Subscriber;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, filter};

use crate::error::LoggingError;

const LOG_ENV: &str = "MOVE_BREAK_LOG";

/// Silences the stderr output while something else owns the terminal.
/// The log file, if any, keeps receiving everything.
#[derive(Debug, Clone, Default)]
pub struct ConsoleGate {
    muted: Arc<AtomicBool>,
}

impl ConsoleGate {
    pub fn mute(&self) {
        self.muted.store(true, Ordering::SeqCst);
    }

    pub fn unmute(&self) {
        self.muted.store(false, Ordering::SeqCst);
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }
}

/// Install the global subscriber: human-readable lines on stderr, plus a
/// plain-text copy appended to `log_file` when one is given.
pub fn init(log_file: Option<&Path>) -> Result<ConsoleGate, LoggingError> {
    let console = ConsoleGate::default();
    let file_layer = log_file
        .map(open_log_file)
        .transpose()?
        .map(|file| {
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file))
        });

    tracing_subscriber::registry()
        .with(env_filter())
        .with(console_layer(std::io::stderr, &console))
        .with(file_layer)
        .try_init()?;
    Ok(console)
}

fn console_layer<S, W>(writer: W, console: &ConsoleGate) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let gate = console.clone();
    fmt::layer()
        .with_target(false)
        .with_writer(writer)
        .with_filter(filter::filter_fn(move |_| !gate.is_muted()))
}

fn env_filter() -> EnvFilter {
    let directives = std::env::var(LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    let open_error = |source| LoggingError::Open {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(open_error)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(open_error)
}
