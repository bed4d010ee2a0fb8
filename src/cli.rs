use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::{ClosePolicy, CompletionMode, PartialConfig, parse_duration};

/// Where the break view is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SurfaceKind {
    /// Full-screen view in this terminal
    #[default]
    Terminal,
    /// An external program speaking length-prefixed JSON on stdin/stdout
    Process,
    /// Clients connecting over WebSocket
    Websocket,
}

#[derive(Debug, Parser)]
#[command(name = "move-break", version, about = "Reminds you to get up and move")]
pub struct Cli {
    /// Work interval, e.g. 25m or 1h30m
    #[arg(long, value_parser = parse_duration, value_name = "DURATION")]
    pub work: Option<Duration>,

    /// Break duration, e.g. 5m or 90s
    #[arg(long = "break", value_parser = parse_duration, value_name = "DURATION")]
    pub break_duration: Option<Duration>,

    /// Log the remaining work time every second instead of every 10 seconds
    #[arg(short, long)]
    pub verbose: bool,

    /// What closing the break window does
    #[arg(long, value_enum)]
    pub close_policy: Option<ClosePolicy>,

    /// What happens when the countdown reaches zero
    #[arg(long, value_enum)]
    pub completion: Option<CompletionMode>,

    /// How often the break view is raised back to the front
    #[arg(long, value_parser = parse_duration, value_name = "DURATION")]
    pub focus_interval: Option<Duration>,

    /// Do not keep raising the break view
    #[arg(long)]
    pub no_focus: bool,

    #[arg(long, value_enum, default_value_t = SurfaceKind::Terminal)]
    pub surface: SurfaceKind,

    /// Program (and arguments) rendering the break view for --surface process
    #[arg(long, num_args = 1.., value_name = "CMD", allow_hyphen_values = true)]
    pub break_window: Vec<String>,

    /// Listen address for --surface websocket
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,

    /// Also append log lines to this file
    #[arg(short, long, value_name = "PATH")]
    pub log: Option<PathBuf>,

    /// Config file, defaults to $XDG_CONFIG_HOME/move-break/config.json
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// The flags that were actually given, as a config layer.
    pub fn overrides(&self) -> PartialConfig {
        PartialConfig {
            work: self.work,
            break_duration: self.break_duration,
            verbose: self.verbose.then_some(true),
            close_policy: self.close_policy,
            completion: self.completion,
            focus_interval: self.focus_interval,
            focus: self.no_focus.then_some(false),
        }
    }
}
