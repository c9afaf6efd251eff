//! Rate-limit courtesy towards the platform.
//!
//! Export and key-mapping calls are spaced by a minimum inter-call interval
//! instead of the fixed unconditional sleep the original tooling used. The
//! interval comes from `http.throttle_ms`; zero disables the throttle.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::{self, Instant};

pub struct Throttle {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Wait until at least the configured interval has passed since the
    /// previous guarded call. Returns immediately when throttling is
    /// disabled or this is the first call.
    pub async fn wait(&self) {
        if self.interval.is_zero() {
            return;
        }

        let now = Instant::now();
        let deadline = {
            let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
            let deadline = match *last {
                Some(previous) => previous + self.interval,
                None => now,
            };
            *last = Some(deadline.max(now));
            deadline
        };

        if deadline > now {
            time::sleep_until(deadline).await;
        }
    }
}
