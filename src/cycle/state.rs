//! The `Cycle` entity: which phase is active and when it ends.
//!
//! Everything here is pure. Callers pass `now` in, which keeps the
//! transitions testable without a clock.

use std::time::Duration;

use tokio::time::Instant;

use super::phase::Phase;

#[derive(Debug, Clone)]
pub struct Cycle {
    phase: Phase,
    work_interval: Duration,
    break_duration: Duration,
    phase_ends_at: Instant,
    break_dismissed: bool,
    countdown_complete: bool,
    break_started_at: Option<Instant>,
    generation: u64,
}

impl Cycle {
    /// A fresh cycle, working, with the first deadline one work interval out.
    pub fn new(work_interval: Duration, break_duration: Duration, now: Instant) -> Self {
        Self {
            phase: Phase::Work,
            work_interval,
            break_duration,
            phase_ends_at: now + work_interval,
            break_dismissed: false,
            countdown_complete: false,
            break_started_at: None,
            generation: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn phase_ends_at(&self) -> Instant {
        self.phase_ends_at
    }

    pub fn break_duration(&self) -> Duration {
        self.break_duration
    }

    pub fn break_dismissed(&self) -> bool {
        self.break_dismissed
    }

    pub fn countdown_complete(&self) -> bool {
        self.countdown_complete
    }

    pub fn break_started_at(&self) -> Option<Instant> {
        self.break_started_at
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True when a tick stamped with `generation` still belongs to the
    /// active phase.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.phase_ends_at.saturating_duration_since(now)
    }

    /// Work -> Break. Returns false when not working.
    pub fn begin_break(&mut self, now: Instant) -> bool {
        if self.phase != Phase::Work {
            return false;
        }
        self.phase = Phase::Break;
        self.phase_ends_at = now + self.break_duration;
        self.break_dismissed = false;
        self.countdown_complete = false;
        self.break_started_at = Some(now);
        self.generation += 1;
        true
    }

    /// Mark the break countdown as finished. Only the first call on a given
    /// break returns true.
    pub fn complete_countdown(&mut self) -> bool {
        if self.phase != Phase::Break || self.countdown_complete {
            return false;
        }
        self.countdown_complete = true;
        true
    }

    /// Break -> Work. Checks and sets `break_dismissed`, so whichever exit
    /// path gets here first wins and every later one is a no-op.
    pub fn end_break(&mut self, now: Instant) -> bool {
        if self.phase != Phase::Break || self.break_dismissed {
            return false;
        }
        self.break_dismissed = true;
        self.phase = Phase::Work;
        self.phase_ends_at = now + self.work_interval;
        self.generation += 1;
        true
    }
}

/// `MM:SS`, rounding partial seconds up so a countdown never shows `00:00`
/// while time is still left.
pub fn format_clock(remaining: Duration) -> String {
    let millis = remaining.as_millis();
    let total_secs = millis.div_ceil(1000);
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}
