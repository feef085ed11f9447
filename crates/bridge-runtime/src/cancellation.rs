//! Cancellation for background link loops.
//!
//! Loops check the flag once per iteration, so a stop request is observed within one
//! poll interval or one read timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default granularity for [`StopFlag::sleep`] (5ms)
pub const DEFAULT_SLEEP_SLICE_MS: u64 = 5;

/// Shared stop signal between a link manager and the thread it spawned.
#[derive(Clone, Debug, Default)]
pub struct StopFlag {
    stopped: Arc<AtomicBool>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Sleep for `duration`, returning early once the flag is set.
    ///
    /// Returns `true` if the full duration elapsed without a stop request.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let slice = Duration::from_millis(DEFAULT_SLEEP_SLICE_MS);
        loop {
            if self.is_stopped() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep(slice.min(deadline - now));
        }
    }
}
