//! Cooperative cancellation shared by the scanner and supervisor loops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Marker returned once a loop observes its stop token; unwinds with `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopped;

const SLEEP_SLICE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Default)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), Stopped> {
        if self.is_cancelled() {
            Err(Stopped)
        } else {
            Ok(())
        }
    }

    /// Sleeps for `duration`, waking early with `Err(Stopped)` on cancellation.
    pub fn sleep(&self, duration: Duration) -> Result<(), Stopped> {
        let deadline = Instant::now() + duration;
        loop {
            self.check()?;
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }
}

/// "Scan now" request that cuts the scanner's wait short.
#[derive(Debug, Clone, Default)]
pub struct ScanTrigger {
    flag: Arc<AtomicBool>,
}

impl ScanTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clears the request, returning whether one was pending.
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_returns_early_when_cancelled_from_another_thread() {
        let token = StopToken::new();
        let remote = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            remote.cancel();
        });

        let started = Instant::now();
        assert_eq!(token.sleep(Duration::from_secs(10)), Err(Stopped));
        assert!(started.elapsed() < Duration::from_secs(2));
        handle.join().unwrap();
    }

    #[test]
    fn trigger_take_clears_the_request() {
        let trigger = ScanTrigger::new();
        assert!(!trigger.take());
        trigger.request();
        assert!(trigger.is_requested());
        assert!(trigger.take());
        assert!(!trigger.is_requested());
    }
}
