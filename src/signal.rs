//! Cooperative control signal for the watch loop.
//!
//! [`ControlSignal`] lets another thread (a front end, a signal handler)
//! ask the polling loop to stop, or to wake up early and re-detect right
//! away ("refresh now"). A refresh does not cancel anything: it only cuts
//! the current wait short, the in-flight detection — if any — still runs to
//! completion and publishes normally.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Interval used by [`ControlSignal::wait`] to check the flags.
const SLEEP_CHUNK: Duration = Duration::from_millis(500);

/// How a [`ControlSignal::wait`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wakeup {
    /// The full interval elapsed; time for the next periodic poll.
    Elapsed,
    /// A refresh was requested; poll again immediately.
    Refresh,
    /// A stop was requested; the loop should end.
    Stopped,
}

/// Shared stop/refresh flags backed by [`AtomicBool`]s.
///
/// The signal is cheaply cloneable (shared via [`Arc`]) so that one clone
/// can live in a handler thread while another is polled inside the loop.
#[derive(Clone, Debug, Default)]
pub struct ControlSignal {
    stop: Arc<AtomicBool>,
    refresh: Arc<AtomicBool>,
}

impl ControlSignal {
    /// Create a new signal with nothing requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a graceful stop of the watch loop.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Ask the watch loop to re-detect without waiting for the next tick.
    pub fn request_refresh(&self) {
        self.refresh.store(true, Ordering::Release);
    }

    /// Returns `true` when a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Wait for `duration` in 500 ms chunks, returning early on a stop or
    /// refresh request. The refresh flag is consumed by this call.
    pub fn wait(&self, duration: Duration) -> Wakeup {
        let mut remaining = duration;
        loop {
            if self.is_stop_requested() {
                return Wakeup::Stopped;
            }
            if self.refresh.swap(false, Ordering::AcqRel) {
                return Wakeup::Refresh;
            }
            if remaining == Duration::ZERO {
                return Wakeup::Elapsed;
            }
            let chunk = remaining.min(SLEEP_CHUNK);
            std::thread::sleep(chunk);
            remaining = remaining.saturating_sub(chunk);
        }
    }
}

#[cfg(test)]
mod control_signal_should {
    use super::*;
    use test_log::test; // Automatically trace tests

    #[test]
    fn start_with_nothing_requested() {
        let sig = ControlSignal::new();
        assert!(!sig.is_stop_requested());
        assert_eq!(sig.wait(Duration::ZERO), Wakeup::Elapsed);
    }

    #[test]
    fn share_state_between_clones() {
        let sig = ControlSignal::new();
        let sig2 = sig.clone();
        sig2.request_stop();
        assert!(sig.is_stop_requested());
    }

    #[test]
    fn prefer_stop_over_refresh() {
        let sig = ControlSignal::new();
        sig.request_refresh();
        sig.request_stop();
        assert_eq!(sig.wait(Duration::from_millis(10)), Wakeup::Stopped);
    }

    #[test]
    fn consume_the_refresh_flag() {
        let sig = ControlSignal::new();
        sig.request_refresh();
        assert_eq!(sig.wait(Duration::from_millis(10)), Wakeup::Refresh);
        assert_eq!(sig.wait(Duration::ZERO), Wakeup::Elapsed);
    }

    #[test]
    fn wake_early_when_stop_arrives_mid_wait() {
        let sig = ControlSignal::new();
        let sig2 = sig.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            sig2.request_stop();
        });
        let start = std::time::Instant::now();
        let wakeup = sig.wait(Duration::from_secs(30));
        assert_eq!(wakeup, Wakeup::Stopped);
        // Must have come back well before the 30 s interval.
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn complete_the_wait_when_nothing_happens() {
        let sig = ControlSignal::new();
        assert_eq!(sig.wait(Duration::from_millis(50)), Wakeup::Elapsed);
    }
}
