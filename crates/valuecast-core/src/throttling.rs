use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use tracing::debug;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Enforces a minimum spacing between consecutive calls.
///
/// Owned by one client instance; clones share the same budget. A zero
/// interval disables limiting.
#[derive(Clone)]
pub struct MinIntervalLimiter {
    limiter: Option<Arc<DirectRateLimiter>>,
    min_interval: Duration,
}

impl MinIntervalLimiter {
    pub fn new(min_interval: Duration) -> Self {
        let limiter = Quota::with_period(min_interval)
            .map(|quota| quota.allow_burst(NonZeroU32::MIN))
            .map(|quota| Arc::new(RateLimiter::direct(quota)));
        Self {
            limiter,
            min_interval,
        }
    }

    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Non-blocking check; `true` consumes the slot.
    pub fn try_acquire(&self) -> bool {
        self.limiter
            .as_ref()
            .map_or(true, |limiter| limiter.check().is_ok())
    }

    /// Waits until the next call is allowed.
    pub async fn acquire(&self) {
        let Some(limiter) = &self.limiter else {
            return;
        };
        if limiter.check().is_err() {
            debug!(min_interval_ms = self.min_interval.as_millis() as u64, "waiting for rate limit slot");
            limiter.until_ready().await;
        }
    }
}

impl std::fmt::Debug for MinIntervalLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MinIntervalLimiter")
            .field("min_interval", &self.min_interval)
            .finish()
    }
}
