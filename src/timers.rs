//! Phase timing for operations.

use std::time::{Duration, Instant};

/// Adds the time between construction and drop to a `Duration` slot.
///
/// Early returns through `?` still record the elapsed time.
///
/// ```rust,ignore
/// let mut resolve = Duration::ZERO;
/// let plan = {
///     let _timer = PhaseTimer::new(&mut resolve);
///     plan(&policy, kind, names)?
/// };
/// ```
pub(crate) struct PhaseTimer<'a> {
    start: Instant,
    slot: &'a mut Duration,
}

impl<'a> PhaseTimer<'a> {
    pub(crate) fn new(slot: &'a mut Duration) -> Self {
        Self {
            start: Instant::now(),
            slot,
        }
    }
}

impl Drop for PhaseTimer<'_> {
    fn drop(&mut self) {
        *self.slot += self.start.elapsed();
    }
}

/// Milliseconds as reported in `OperationPhases`.
pub(crate) fn as_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1_000.0
}
