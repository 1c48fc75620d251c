//! Public transport departures

use std::time::{Duration, SystemTime};

/// Provider of upcoming departure times for a line
pub trait TransitSource: Send + Sync {
    /// Next departure of `line`, `None` when unknown
    fn next_arrival(&self, line: &str) -> Option<SystemTime>;

    /// Last departure of the day for `line`, `None` when unknown
    fn next_last_arrival(&self, line: &str) -> Option<SystemTime>;
}

/// Fixed-offset schedule used until a live timetable feed is wired in
#[derive(Debug, Clone, Copy)]
pub struct ScheduledTransit {
    pub next_in: Duration,
    pub last_in: Duration,
}

impl Default for ScheduledTransit {
    fn default() -> Self {
        Self {
            next_in: Duration::from_secs(7 * 60 + 20),
            last_in: Duration::from_secs(15 * 60),
        }
    }
}

impl TransitSource for ScheduledTransit {
    fn next_arrival(&self, _line: &str) -> Option<SystemTime> {
        SystemTime::now().checked_add(self.next_in)
    }

    fn next_last_arrival(&self, _line: &str) -> Option<SystemTime> {
        SystemTime::now().checked_add(self.last_in)
    }
}
