use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid duration {input:?}: expected values like 25m, 90s, 1h30m or 500ms")]
    InvalidDuration { input: String },

    #[error("{name} must be greater than zero")]
    ZeroDuration { name: &'static str },

    #[error("{name} must not be longer than {max}")]
    DurationTooLong { name: &'static str, max: String },

    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("the process surface needs a program, pass --break-window <cmd>")]
    MissingBreakWindow,
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("presentation surface is no longer running")]
    Disconnected,

    #[error("failed to launch break window {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification dispatch failed: {0}")]
    Dispatch(String),

    #[error("no async runtime available to dispatch the notification")]
    NoRuntime,
}

#[derive(Debug, Error)]
pub enum FocusError {
    #[error("{program} exited with {status}")]
    CommandFailed {
        program: &'static str,
        status: std::process::ExitStatus,
    },

    #[error("window raising is not supported on this desktop")]
    Unsupported,

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Init(#[from] tracing_subscriber::util::TryInitError),
}
