//! A single-slot cancellable timer driven by injected time.

use std::time::Instant;

/// Holds at most one pending action.
///
/// Scheduling replaces whatever was pending, so there is never more than
/// one timer outstanding. Time only advances when the owner calls
/// [`TimerSlot::take_due`].
#[derive(Debug, Clone)]
pub struct TimerSlot<T> {
    pending: Option<(Instant, T)>,
}

impl<T> Default for TimerSlot<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> TimerSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the slot, returning the action it replaced.
    pub fn schedule(&mut self, due: Instant, action: T) -> Option<T> {
        self.pending.replace((due, action)).map(|(_, old)| old)
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, action)| action)
    }

    /// Take the pending action if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((due, _)) if *due <= now => self.cancel(),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|(_, action)| action)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(due, _)| *due)
    }
}
