//! Cancellable debounce timers driven by an external clock.

use std::time::{Duration, Instant};

use tracing::debug;

/// A single-shot timer that restarts on every [`Debouncer::schedule`].
///
/// The owner polls [`Debouncer::fire_if_due`] with the current instant; only
/// the last schedule before the deadline ever fires.
#[derive(Debug, Clone)]
pub struct Debouncer {
    label: &'static str,
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(label: &'static str, delay: Duration) -> Self {
        Self {
            label,
            delay,
            deadline: None,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm the timer for `now + delay`, replacing any earlier deadline.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Disarm the timer. Returns whether a deadline was pending.
    pub fn cancel(&mut self) -> bool {
        let pending = self.deadline.take().is_some();
        if pending {
            debug!(timer = self.label, "Pending timer cancelled");
        }
        pending
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Disarm and report `true` when the deadline has been reached.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                debug!(timer = self.label, "Timer fired");
                true
            }
            _ => false,
        }
    }
}
