use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Client-side request budget for the upstream free tier.
///
/// When the budget is spent the gateway answers with a rate-limit error
/// instead of spending an upstream call that would come back as a `Note`.
#[derive(Clone)]
pub struct RequestBudget {
    limiter: Option<Arc<DirectRateLimiter>>,
}

impl RequestBudget {
    /// `quota_limit` requests per `quota_window`, all available as a burst.
    /// A zero limit disables the budget.
    pub fn new(quota_window: Duration, quota_limit: u32) -> Self {
        let limiter = NonZeroU32::new(quota_limit)
            .map(|limit| Arc::new(RateLimiter::direct(quota_from_window(quota_window, limit))));
        Self { limiter }
    }

    /// Spends one request. On exhaustion returns how long until the next one
    /// is available.
    pub fn acquire(&self) -> Result<(), Duration> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };

        limiter
            .check()
            .map_err(|not_until| not_until.wait_time_from(DefaultClock::default().now()))
    }
}

impl std::fmt::Debug for RequestBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBudget")
            .field("limited", &self.limiter.is_some())
            .finish()
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: NonZeroU32) -> Quota {
    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(quota_limit.get())).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(quota_limit))
        .allow_burst(quota_limit)
}
