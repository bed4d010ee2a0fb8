use std::time::Duration;

use chrono::{DateTime, Local};

use crate::config::format_duration;

/// How a break ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakExit {
    Acknowledged,
    Skipped,
    AutoReturned,
    WindowClosed,
}

impl BreakExit {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakExit::Acknowledged => "acknowledged",
            BreakExit::Skipped => "skipped",
            BreakExit::AutoReturned => "auto-returned",
            BreakExit::WindowClosed => "window closed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionStats {
    pub session_start: DateTime<Local>,
    pub breaks_started: u32,
    pub acknowledged: u32,
    pub skipped: u32,
    pub auto_returned: u32,
    pub window_closed: u32,
    pub time_on_break: Duration,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            session_start: Local::now(),
            breaks_started: 0,
            acknowledged: 0,
            skipped: 0,
            auto_returned: 0,
            window_closed: 0,
            time_on_break: Duration::ZERO,
        }
    }

    pub fn record_start(&mut self) {
        self.breaks_started += 1;
    }

    pub fn record_exit(&mut self, exit: BreakExit, spent: Duration) {
        match exit {
            BreakExit::Acknowledged => self.acknowledged += 1,
            BreakExit::Skipped => self.skipped += 1,
            BreakExit::AutoReturned => self.auto_returned += 1,
            BreakExit::WindowClosed => self.window_closed += 1,
        }
        self.time_on_break += spent;
    }

    /// A break cut short by quitting: its time counts, it has no exit.
    pub fn record_interrupted(&mut self, spent: Duration) {
        self.time_on_break += spent;
    }

    /// Breaks that ran their full course.
    pub fn completed(&self) -> u32 {
        self.acknowledged + self.auto_returned + self.window_closed
    }

    pub fn session_duration(&self) -> Duration {
        (Local::now() - self.session_start)
            .to_std()
            .unwrap_or_default()
    }

    pub fn summary(&self) -> Vec<String> {
        vec![
            format!(
                "Session started: {}",
                self.session_start.format("%Y-%m-%d %H:%M:%S")
            ),
            format!(
                "Session duration: {}",
                format_duration(whole_seconds(self.session_duration()))
            ),
            format!(
                "Breaks: {} started, {} completed, {} skipped",
                self.breaks_started,
                self.completed(),
                self.skipped
            ),
            format!(
                "Time on break: {}",
                format_duration(whole_seconds(self.time_on_break))
            ),
        ]
    }

    pub fn print_stats(&self) {
        println!("\n--- Session Statistics ---");
        for line in self.summary() {
            println!("{}", line);
        }
        println!("--------------------------\n");
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

fn whole_seconds(duration: Duration) -> Duration {
    Duration::from_secs(duration.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn an_interrupted_break_only_adds_time() {
        let mut stats = SessionStats::new();
        stats.record_start();
        stats.record_interrupted(Duration::from_secs(42));

        assert_eq!(stats.time_on_break, Duration::from_secs(42));
        assert_eq!(stats.completed(), 0);
        assert_eq!(stats.skipped, 0);
        assert!(stats.summary().contains(&"Time on break: 42s".to_string()));
    }

    #[test]
    fn counts_exits_by_kind() {
        let mut stats = SessionStats::new();
        stats.record_start();
        stats.record_exit(BreakExit::Acknowledged, Duration::from_secs(300));
        stats.record_start();
        stats.record_exit(BreakExit::Skipped, Duration::from_secs(20));
        stats.record_start();
        stats.record_exit(BreakExit::WindowClosed, Duration::from_secs(301));

        assert_eq!(stats.breaks_started, 3);
        assert_eq!(stats.completed(), 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.time_on_break, Duration::from_secs(621));
    }

    #[test]
    fn summary_mentions_the_totals() {
        let mut stats = SessionStats::new();
        stats.record_start();
        stats.record_exit(BreakExit::AutoReturned, Duration::from_millis(120_400));

        let summary = stats.summary().join("\n");
        assert!(summary.contains("Breaks: 1 started, 1 completed, 0 skipped"));
        assert!(summary.contains("Time on break: 2m"));
    }
}
