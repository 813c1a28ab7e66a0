use std::time::{Duration, Instant};

pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);

/// Identifies one scheduling of the timer. A restart issues a new handle,
/// which makes any older handle inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct Pending<T> {
    value: T,
    deadline: Instant,
    handle: TimerHandle,
}

/// Single-shot delayed value with restart-on-input. Time is passed in by
/// the caller's event loop, so nothing here sleeps or spawns.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
    issued: u64,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            issued: 0,
        }
    }

    /// Replaces whatever was pending and restarts the window from `now`.
    pub fn schedule(&mut self, value: T, now: Instant) -> TimerHandle {
        self.issued += 1;
        let handle = TimerHandle(self.issued);
        self.pending = Some(Pending {
            value,
            deadline: now + self.delay,
            handle,
        });
        handle
    }

    /// Cancels the timer only if `handle` is still the live one.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<T> {
        match &self.pending {
            Some(p) if p.handle == handle => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Returns the pending value once its window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some(p) if now >= p.deadline => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    /// Fires immediately, regardless of the deadline.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.value)
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}
