pub const DEFAULT_WORK_SECS: u64 = 25 * 60; // Default work interval
pub const DEFAULT_BREAK_SECS: u64 = 5 * 60; // Default break duration
pub const DEFAULT_FOCUS_INTERVAL_MS: u64 = 500; // Re-raise the break view twice a second
pub const VERBOSE_REPORT_SECS: u64 = 1;
pub const QUIET_REPORT_SECS: u64 = 10;
pub const COUNTDOWN_TICK_SECS: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Work => "WORK",
            Phase::Break => "BREAK",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Phase::Work => "💼",
            Phase::Break => "🚶",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
