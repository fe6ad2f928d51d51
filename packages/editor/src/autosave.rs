//! # Autosave Debounce
//!
//! Trailing-edge debounce for saves. Each edit schedules a save one quiet
//! period out and replaces whatever was pending, so a burst of typing
//! produces one save after the last keystroke. Time is passed in by the
//! caller, which keeps the debouncer usable from both a timer loop and
//! tests.

use std::time::{Duration, Instant};

/// Handle for one scheduled save; superseded by the next `schedule`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledSave {
    pub generation: u64,
    pub due_at: Instant,
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    pending: Option<ScheduledSave>,
    generation: u64,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            generation: 0,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Schedule a save `window` after `now`, cancelling the previous one
    pub fn schedule(&mut self, now: Instant) -> ScheduledSave {
        self.generation += 1;
        let handle = ScheduledSave {
            generation: self.generation,
            due_at: now + self.window,
        };
        self.pending = Some(handle);
        handle
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.due_at)
    }

    /// Whether `handle` is still the live schedule
    pub fn is_current(&self, handle: &ScheduledSave) -> bool {
        self.pending.as_ref() == Some(handle)
    }

    /// Take the pending save if it is due. Fires at most once per schedule.
    pub fn poll(&mut self, now: Instant) -> Option<ScheduledSave> {
        match self.pending {
            Some(pending) if now >= pending.due_at => self.pending.take(),
            _ => None,
        }
    }
}
