//! Heartbeat and diagnostics scheduling.
//!
//! Both jobs run on tick boundaries: tick `k * interval` for `k >= 1`. Each
//! boundary fires at most once. While a call is in progress nothing fires;
//! boundaries crossed in the meantime collapse into a single run as soon as
//! the call slot is free again.

use intercom_types::Tick;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Ticks between heartbeats.
    pub heartbeat_interval: u64,
    /// Ticks between full self-tests.
    pub diagnostics_interval: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: 60,
            diagnostics_interval: 86_400,
        }
    }
}

/// Jobs due on this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DueWork {
    pub heartbeat: bool,
    pub diagnostics: bool,
}

impl DueWork {
    pub fn is_empty(&self) -> bool {
        !self.heartbeat && !self.diagnostics
    }
}

/// Tracks the last boundary each job ran for.
#[derive(Debug, Clone, Copy)]
struct Job {
    interval: u64,
    last_boundary: u64,
}

impl Job {
    fn new(interval: u64) -> Self {
        Self {
            interval,
            last_boundary: 0,
        }
    }

    fn due(&mut self, now: Tick, busy: bool) -> bool {
        let boundary = now.periods(self.interval);
        if busy || boundary <= self.last_boundary {
            return false;
        }
        self.last_boundary = boundary;
        true
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    heartbeat: Job,
    diagnostics: Job,
}

impl Scheduler {
    /// An interval of zero disables that job.
    pub fn new(config: ScheduleConfig) -> Self {
        Self {
            heartbeat: Job::new(config.heartbeat_interval),
            diagnostics: Job::new(config.diagnostics_interval),
        }
    }

    /// Returns the jobs to run at `now`. `busy` defers everything.
    pub fn poll(&mut self, now: Tick, busy: bool) -> DueWork {
        DueWork {
            heartbeat: self.heartbeat.due(now, busy),
            diagnostics: self.diagnostics.due(now, busy),
        }
    }
}
