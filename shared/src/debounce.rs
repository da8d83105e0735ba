//! Trailing-edge debouncing with caller-owned timer handles.
//!
//! The debouncer never starts timers itself. `schedule` asks the caller to
//! start one and keeps the returned handle; dropping a handle must cancel
//! its timer (as `seed::app::CmdHandle` does). Only the timer from the most
//! recent `schedule` can still fire.

use std::time::Duration;

#[derive(Debug)]
pub struct Debouncer<H> {
    delay: Duration,
    pending: Option<H>,
}

impl<H> Debouncer<H> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Cancels the pending timer, if any, then starts a new one.
    pub fn schedule(&mut self, start: impl FnOnce(Duration) -> H) {
        self.pending = None;
        self.pending = Some(start(self.delay));
    }

    /// Returns whether a timer was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Called when the timer elapsed. Returns `false` if nothing was pending,
    /// in which case the caller must not act.
    pub fn fire(&mut self) -> bool {
        self.pending.take().is_some()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeClock;
    use super::*;

    #[test]
    fn test_reschedule_cancels_previous_timer() {
        let clock = FakeClock::default();
        let mut debouncer = Debouncer::new(Duration::from_millis(500));

        debouncer.schedule(|delay| clock.start(delay));
        debouncer.schedule(|delay| clock.start(delay));
        debouncer.schedule(|delay| clock.start(delay));

        assert_eq!(clock.cancelled(), vec![1, 2]);
        assert!(debouncer.is_pending());
    }

    #[test]
    fn test_fire_only_once() {
        let clock = FakeClock::default();
        let mut debouncer = Debouncer::new(Duration::from_millis(200));
        debouncer.schedule(|delay| {
            assert_eq!(delay, Duration::from_millis(200));
            clock.start(delay)
        });

        assert!(debouncer.fire());
        assert!(!debouncer.fire());
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_cancel() {
        let clock = FakeClock::default();
        let mut debouncer = Debouncer::new(Duration::from_millis(200));
        assert!(!debouncer.cancel());

        debouncer.schedule(|delay| clock.start(delay));
        assert!(debouncer.cancel());
        assert_eq!(clock.cancelled(), vec![1]);
        assert!(!debouncer.fire());
    }
}
