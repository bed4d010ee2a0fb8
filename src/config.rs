//! Startup configuration.
//!
//! Settings are layered: built-in defaults, then an optional JSON file, then
//! command-line flags. The result is frozen into a [`Config`] that is handed
//! to the controller and never mutated afterwards.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Deserializer};

use crate::cycle::phase::{
    DEFAULT_BREAK_SECS, DEFAULT_FOCUS_INTERVAL_MS, DEFAULT_WORK_SECS, QUIET_REPORT_SECS,
    VERBOSE_REPORT_SECS,
};
use crate::error::ConfigError;

const CONFIG_DIR: &str = "move-break";
const CONFIG_FILE: &str = "config.json";
const MAX_DURATION_SECS: u64 = 7 * 24 * 60 * 60;

/// What a close attempt through the window manager does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClosePolicy {
    /// Treat it as a request to quit the application.
    Quit,
    /// Never close; restate the available options instead.
    Block,
    /// Block while time remains, behave like "Return to Work" afterwards.
    #[default]
    BlockUntilComplete,
}

impl ClosePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClosePolicy::Quit => "quit",
            ClosePolicy::Block => "block",
            ClosePolicy::BlockUntilComplete => "block-until-complete",
        }
    }
}

/// What happens when the break countdown reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionMode {
    /// Keep the break open until the user returns to work.
    #[default]
    Acknowledge,
    /// Go back to work on our own.
    AutoReturn,
}

impl CompletionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionMode::Acknowledge => "acknowledge",
            CompletionMode::AutoReturn => "auto-return",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub work_interval: Duration,
    pub break_duration: Duration,
    pub verbose: bool,
    pub close_policy: ClosePolicy,
    pub completion: CompletionMode,
    /// `None` disables focus retention.
    pub focus_interval: Option<Duration>,
}

impl Config {
    /// Cadence of the "work time remaining" log line.
    pub fn report_interval(&self) -> Duration {
        if self.verbose {
            Duration::from_secs(VERBOSE_REPORT_SECS)
        } else {
            Duration::from_secs(QUIET_REPORT_SECS)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_interval: Duration::from_secs(DEFAULT_WORK_SECS),
            break_duration: Duration::from_secs(DEFAULT_BREAK_SECS),
            verbose: false,
            close_policy: ClosePolicy::default(),
            completion: CompletionMode::default(),
            focus_interval: Some(Duration::from_millis(DEFAULT_FOCUS_INTERVAL_MS)),
        }
    }
}

impl TryFrom<PartialConfig> for Config {
    type Error = ConfigError;

    fn try_from(partial: PartialConfig) -> Result<Self, Self::Error> {
        let defaults = Config::default();

        let work_interval = checked(
            "work interval",
            partial.work.unwrap_or(defaults.work_interval),
        )?;
        let break_duration = checked(
            "break duration",
            partial.break_duration.unwrap_or(defaults.break_duration),
        )?;

        let focus_interval = if partial.focus.unwrap_or(true) {
            let every = partial
                .focus_interval
                .or(defaults.focus_interval)
                .unwrap_or(Duration::from_millis(DEFAULT_FOCUS_INTERVAL_MS));
            Some(checked("focus interval", every)?)
        } else {
            None
        };

        Ok(Config {
            work_interval,
            break_duration,
            verbose: partial.verbose.unwrap_or(defaults.verbose),
            close_policy: partial.close_policy.unwrap_or(defaults.close_policy),
            completion: partial.completion.unwrap_or(defaults.completion),
            focus_interval,
        })
    }
}

/// Durations have to be non-zero and short enough to add to a deadline.
fn checked(name: &'static str, duration: Duration) -> Result<Duration, ConfigError> {
    if duration.is_zero() {
        return Err(ConfigError::ZeroDuration { name });
    }
    if duration > Duration::from_secs(MAX_DURATION_SECS) {
        return Err(ConfigError::DurationTooLong {
            name,
            max: format_duration(Duration::from_secs(MAX_DURATION_SECS)),
        });
    }
    Ok(duration)
}

/// One layer of settings. Every field is optional so layers can be stacked.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialConfig {
    #[serde(deserialize_with = "optional_duration")]
    pub work: Option<Duration>,
    #[serde(rename = "break", deserialize_with = "optional_duration")]
    pub break_duration: Option<Duration>,
    pub verbose: Option<bool>,
    pub close_policy: Option<ClosePolicy>,
    pub completion: Option<CompletionMode>,
    #[serde(deserialize_with = "optional_duration")]
    pub focus_interval: Option<Duration>,
    pub focus: Option<bool>,
}

impl PartialConfig {
    /// Load the config file. An explicit path must exist; the default
    /// location is only read when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let data = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Stack `over` on top of `self`; values set in `over` win.
    pub fn layer(self, over: PartialConfig) -> PartialConfig {
        PartialConfig {
            work: over.work.or(self.work),
            break_duration: over.break_duration.or(self.break_duration),
            verbose: over.verbose.or(self.verbose),
            close_policy: over.close_policy.or(self.close_policy),
            completion: over.completion.or(self.completion),
            focus_interval: over.focus_interval.or(self.focus_interval),
            focus: over.focus.or(self.focus),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Parse durations such as `25m`, `10s`, `1h30m`, `1.5h` or `500ms`.
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration {
        input: input.to_string(),
    };
    let text = input.trim();
    if text == "0" {
        return Ok(Duration::ZERO);
    }

    let whole = Regex::new(r"^(?:\d+(?:\.\d+)?(?:ms|h|m|s))+$").map_err(|_| invalid())?;
    if !whole.is_match(text) {
        return Err(invalid());
    }

    let group = Regex::new(r"(\d+(?:\.\d+)?)(ms|h|m|s)").map_err(|_| invalid())?;
    let mut total = Duration::ZERO;
    for captures in group.captures_iter(text) {
        let value: f64 = captures[1].parse().map_err(|_| invalid())?;
        let unit_secs = match &captures[2] {
            "h" => 3600.0,
            "m" => 60.0,
            "s" => 1.0,
            "ms" => 0.001,
            _ => return Err(invalid()),
        };
        let part = Duration::try_from_secs_f64(value * unit_secs).map_err(|_| invalid())?;
        total = total.checked_add(part).ok_or_else(invalid)?;
    }
    Ok(total)
}

/// Render a duration the way it is written on the command line.
pub fn format_duration(duration: Duration) -> String {
    if duration.is_zero() {
        return "0s".to_string();
    }
    if duration < Duration::from_secs(1) {
        return format!("{}ms", duration.as_millis());
    }

    let secs = duration.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    if seconds > 0 {
        out.push_str(&format!("{seconds}s"));
    }
    out
}

fn optional_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|text| parse_duration(&text).map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_go_style_durations() {
        assert_eq!(parse_duration("25m").unwrap(), Duration::from_secs(1500));
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration(" 2m5s ").unwrap(), Duration::from_secs(125));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn rejects_malformed_durations() {
        for input in ["", "25", "m", "5 m", "-5m", "5d", "1h-30m", "abc"] {
            assert!(
                matches!(
                    parse_duration(input),
                    Err(ConfigError::InvalidDuration { .. })
                ),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn formats_durations_compactly() {
        assert_eq!(format_duration(Duration::from_secs(1500)), "25m");
        assert_eq!(format_duration(Duration::from_secs(5400)), "1h30m");
        assert_eq!(format_duration(Duration::from_secs(2)), "2s");
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::ZERO), "0s");
    }

    #[test]
    fn defaults_match_the_classic_pomodoro() {
        let config = Config::try_from(PartialConfig::default()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.work_interval, Duration::from_secs(25 * 60));
        assert_eq!(config.break_duration, Duration::from_secs(5 * 60));
        assert_eq!(config.close_policy, ClosePolicy::BlockUntilComplete);
        assert_eq!(config.completion, CompletionMode::Acknowledge);
        assert_eq!(config.report_interval(), Duration::from_secs(10));
    }

    #[test]
    fn absurdly_long_durations_are_rejected() {
        let partial = PartialConfig {
            work: Some(parse_duration("3000000000000000h").unwrap()),
            ..PartialConfig::default()
        };
        assert!(matches!(
            Config::try_from(partial),
            Err(ConfigError::DurationTooLong {
                name: "work interval",
                ..
            })
        ));

        let partial = PartialConfig {
            break_duration: Some(Duration::from_secs(MAX_DURATION_SECS + 1)),
            ..PartialConfig::default()
        };
        assert!(Config::try_from(partial).is_err());

        let partial = PartialConfig {
            work: Some(Duration::from_secs(MAX_DURATION_SECS)),
            ..PartialConfig::default()
        };
        assert!(Config::try_from(partial).is_ok());
    }

    #[test]
    fn verbose_reports_every_second() {
        let config = Config {
            verbose: true,
            ..Config::default()
        };
        assert_eq!(config.report_interval(), Duration::from_secs(1));
    }

    #[test]
    fn later_layers_win() {
        let file = PartialConfig {
            work: Some(Duration::from_secs(60)),
            break_duration: Some(Duration::from_secs(30)),
            verbose: Some(true),
            ..PartialConfig::default()
        };
        let flags = PartialConfig {
            work: Some(Duration::from_secs(2)),
            close_policy: Some(ClosePolicy::Quit),
            ..PartialConfig::default()
        };

        let config = Config::try_from(file.layer(flags)).unwrap();
        assert_eq!(config.work_interval, Duration::from_secs(2));
        assert_eq!(config.break_duration, Duration::from_secs(30));
        assert!(config.verbose);
        assert_eq!(config.close_policy, ClosePolicy::Quit);
    }

    #[test]
    fn zero_durations_are_rejected() {
        let partial = PartialConfig {
            work: Some(Duration::ZERO),
            ..PartialConfig::default()
        };
        assert!(matches!(
            Config::try_from(partial),
            Err(ConfigError::ZeroDuration {
                name: "work interval"
            })
        ));

        let partial = PartialConfig {
            focus_interval: Some(Duration::ZERO),
            ..PartialConfig::default()
        };
        assert!(Config::try_from(partial).is_err());
    }

    #[test]
    fn focus_can_be_disabled() {
        let partial = PartialConfig {
            focus: Some(false),
            focus_interval: Some(Duration::ZERO),
            ..PartialConfig::default()
        };
        assert_eq!(Config::try_from(partial).unwrap().focus_interval, None);
    }

    #[test]
    fn reads_json_config_files() {
        let json = r#"{
            "work": "50m",
            "break": "10m",
            "close_policy": "block",
            "completion": "auto-return",
            "focus_interval": "1s"
        }"#;
        let partial: PartialConfig = serde_json::from_str(json).unwrap();
        assert_eq!(partial.work, Some(Duration::from_secs(3000)));
        assert_eq!(partial.break_duration, Some(Duration::from_secs(600)));
        assert_eq!(partial.close_policy, Some(ClosePolicy::Block));
        assert_eq!(partial.completion, Some(CompletionMode::AutoReturn));
        assert_eq!(partial.focus_interval, Some(Duration::from_secs(1)));
        assert_eq!(partial.verbose, None);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_durations_in_files() {
        assert!(serde_json::from_str::<PartialConfig>(r#"{"wrok": "5m"}"#).is_err());
        assert!(serde_json::from_str::<PartialConfig>(r#"{"work": "soon"}"#).is_err());
    }

    #[test]
    fn explicit_config_path_must_exist() {
        let missing = std::env::temp_dir().join("move-break-does-not-exist.json");
        assert!(matches!(
            PartialConfig::load(Some(&missing)),
            Err(ConfigError::Read { .. })
        ));
    }
}
