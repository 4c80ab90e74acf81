//! Rate limiting utilities

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a rate limiter with the specified events per second
pub fn create_limiter(events_per_second: u32) -> Arc<Limiter> {
    let quota = Quota::per_second(NonZeroU32::new(events_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Throttle for outbound `move` events. Unlimited unless a cap is set.
#[derive(Clone, Default)]
pub struct MoveThrottle {
    limiter: Option<Arc<Limiter>>,
}

impl MoveThrottle {
    pub fn new(events_per_second: Option<u32>) -> Self {
        Self {
            limiter: events_per_second.map(create_limiter),
        }
    }

    pub fn unlimited() -> Self {
        Self { limiter: None }
    }

    /// Check if a move event may be sent now (returns true if allowed)
    pub fn check(&self) -> bool {
        self.limiter
            .as_ref()
            .map_or(true, |limiter| limiter.check().is_ok())
    }
}
