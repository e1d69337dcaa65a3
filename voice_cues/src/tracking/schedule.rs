//! Fixed-interval timers driven by the host clock.

/// Fires at most once per interval of host time.
///
/// A fresh timer is due on the first check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalTimer {
    interval: f64,
    next_due: f64,
}

impl IntervalTimer {
    /// Create a timer that is due immediately.
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            next_due: f64::NEG_INFINITY,
        }
    }

    /// Whether the timer fires at `now`. Firing schedules the next run one interval later.
    pub fn due(&mut self, now: f64) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due = now + self.interval;
        true
    }

    /// Hold the timer back until at least `time`.
    pub fn defer_until(&mut self, time: f64) {
        self.next_due = self.next_due.max(time);
    }

    /// Make the timer due on the next check.
    pub fn reset(&mut self) {
        self.next_due = f64::NEG_INFINITY;
    }

    /// Get the configured interval.
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Get the earliest time the timer fires again.
    pub fn next_due(&self) -> f64 {
        self.next_due
    }
}
