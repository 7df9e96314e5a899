//! Per-client rate limiting (governor, keyed by client IP).
//!
//! A limit of `max` per `window` is a bucket of `max` cells that refills one
//! cell every `window / max`, so a client can spend the whole allowance at
//! once and then waits for it to refill.
//!
//! Clients whose bucket has fully refilled are indistinguishable from new ones
//! and are dropped by a background task once per window.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};

use crate::config::RateLimitSettings;

type KeyedLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

#[derive(Clone)]
pub struct ClientRateLimiter {
    limiter: Arc<KeyedLimiter>,
    clock: DefaultClock,
    window: Duration,
}

impl core::fmt::Debug for ClientRateLimiter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClientRateLimiter")
            .field("tracked_clients", &self.limiter.len())
            .finish()
    }
}

impl ClientRateLimiter {
    pub fn new(settings: RateLimitSettings) -> Self {
        let period = settings.window / settings.max.get();
        let quota = Quota::with_period(period.max(Duration::from_nanos(1)))
            .unwrap_or_else(|| Quota::per_second(settings.max))
            .allow_burst(settings.max);

        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            clock: DefaultClock::default(),
            window: settings.window,
        }
    }

    /// Take one cell for `client`. On refusal, returns whole seconds until the
    /// next cell is available (at least 1).
    pub fn check(&self, client: IpAddr) -> Result<(), u64> {
        self.limiter.check_key(&client).map_err(|not_until| {
            let wait = not_until.wait_time_from(self.clock.now());
            wait.as_secs().max(1)
        })
    }

    /// Number of clients currently tracked.
    pub fn len(&self) -> usize {
        self.limiter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limiter.is_empty()
    }

    /// Forget clients whose allowance has fully refilled.
    pub fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Prune once per window until every handle to this limiter is dropped.
    pub fn spawn_pruning(&self) -> tokio::task::JoinHandle<()> {
        let limiter = Arc::downgrade(&self.limiter);
        let mut ticks = tokio::time::interval(self.window);
        ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tokio::spawn(async move {
            // The first tick completes immediately.
            ticks.tick().await;
            loop {
                ticks.tick().await;
                let Some(limiter) = limiter.upgrade() else {
                    break;
                };
                let before = limiter.len();
                limiter.retain_recent();
                limiter.shrink_to_fit();
                debug!(before, after = limiter.len(), "pruned rate limiter state");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;

    fn limiter(max: u32, window_secs: u64) -> ClientRateLimiter {
        limiter_with_window(max, Duration::from_secs(window_secs))
    }

    fn limiter_with_window(max: u32, window: Duration) -> ClientRateLimiter {
        ClientRateLimiter::new(RateLimitSettings {
            max: NonZeroU32::new(max).unwrap(),
            window,
        })
    }

    #[test]
    fn allows_burst_then_refuses() {
        let l = limiter(5, 900);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        for _ in 0..5 {
            assert!(l.check(ip).is_ok());
        }
        let retry = l.check(ip).unwrap_err();
        assert!(retry >= 1 && retry <= 180);
    }

    #[test]
    fn clients_are_tracked_independently() {
        let l = limiter(1, 900);
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();
        assert!(l.check(a).is_ok());
        assert!(l.check(a).is_err());
        assert!(l.check(b).is_ok());
    }

    #[test]
    fn prune_forgets_refilled_clients_only() {
        let l = limiter_with_window(2, Duration::from_millis(200));
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        assert!(l.check(a).is_ok());

        l.prune();
        assert_eq!(l.len(), 1);

        std::thread::sleep(Duration::from_millis(400));
        let b: IpAddr = "10.0.0.2".parse().unwrap();
        assert!(l.check(b).is_ok());

        l.prune();
        assert_eq!(l.len(), 1);
        assert!(l.check(b).is_ok());
    }

    #[tokio::test]
    async fn background_pruning_bounds_tracked_clients() {
        let l = limiter_with_window(1, Duration::from_millis(100));
        for i in 0..50u8 {
            assert!(l.check(IpAddr::from([10, 0, 1, i])).is_ok());
        }
        assert_eq!(l.len(), 50);

        let task = l.spawn_pruning();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(l.is_empty());

        drop(l);
        tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
    }
}
