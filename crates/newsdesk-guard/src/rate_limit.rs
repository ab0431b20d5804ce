//! Sliding-window rate limiter.
//!
//! Each key keeps the timestamps of its accepted requests. A check prunes
//! timestamps at or before `now - window`, rejects when `limit` remain, and
//! otherwise records `now`. Stale keys are dropped by an occasional sweep
//! triggered from `check` with a configurable probability.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use newsdesk_config::WindowLimit;
use newsdesk_core::Clock;
use rand::Rng;
use tracing::debug;

/// Accepted request: what is left of the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub limit: u32,
    pub remaining: u32,
    /// When the oldest retained request leaves the window.
    pub reset_at: DateTime<Utc>,
}

/// Rejected request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimited {
    pub limit: u32,
    /// Whole seconds until a slot frees up, at least 1.
    pub retry_after_secs: u64,
    pub reset_at: DateTime<Utc>,
}

pub struct RateLimiter {
    name: &'static str,
    limit: WindowLimit,
    cleanup_probability: f64,
    clock: Arc<dyn Clock>,
    counters: DashMap<String, VecDeque<DateTime<Utc>>>,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("name", &self.name)
            .field("limit", &self.limit)
            .field("keys", &self.counters.len())
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    pub fn new(
        name: &'static str,
        limit: WindowLimit,
        cleanup_probability: f64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            name,
            limit,
            cleanup_probability: cleanup_probability.clamp(0.0, 1.0),
            clock,
            counters: DashMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn limit(&self) -> WindowLimit {
        self.limit
    }

    fn window(&self) -> Duration {
        Duration::milliseconds(self.limit.window_ms.min(i64::MAX as u64) as i64)
    }

    /// Counts a request against `key`.
    pub fn check(&self, key: &str) -> Result<RateLimitStatus, RateLimited> {
        let now = self.clock.now();
        let window = self.window();
        let cutoff = now - window;

        let outcome = {
            let mut timestamps = self.counters.entry(key.to_string()).or_default();
            while timestamps.front().is_some_and(|ts| *ts <= cutoff) {
                timestamps.pop_front();
            }

            if timestamps.len() >= self.limit.limit as usize {
                let reset_at = timestamps.front().map_or(now + window, |oldest| *oldest + window);
                let millis = (reset_at - now).num_milliseconds().max(0) as u64;
                Err(RateLimited {
                    limit: self.limit.limit,
                    retry_after_secs: millis.div_ceil(1000).max(1),
                    reset_at,
                })
            } else {
                timestamps.push_back(now);
                let reset_at = timestamps.front().map_or(now + window, |oldest| *oldest + window);
                Ok(RateLimitStatus {
                    limit: self.limit.limit,
                    remaining: self.limit.limit.saturating_sub(timestamps.len() as u32),
                    reset_at,
                })
            }
        };

        self.maybe_sweep();
        outcome
    }

    /// Forgets everything recorded for `key`.
    pub fn reset(&self, key: &str) {
        self.counters.remove(key);
    }

    /// Drops keys whose timestamps have all left the window. Returns how many.
    pub fn sweep(&self) -> usize {
        let cutoff = self.clock.now() - self.window();
        let before = self.counters.len();
        self.counters
            .retain(|_, timestamps| timestamps.back().is_some_and(|last| *last > cutoff));
        let removed = before.saturating_sub(self.counters.len());
        if removed > 0 {
            debug!(limiter = self.name, removed, "swept stale rate limit keys");
        }
        removed
    }

    fn maybe_sweep(&self) {
        if self.cleanup_probability > 0.0 && rand::thread_rng().gen_bool(self.cleanup_probability)
        {
            self.sweep();
        }
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsdesk_core::ManualClock;

    fn limiter(limit: u32, window_ms: u64, clock: &ManualClock) -> RateLimiter {
        RateLimiter::new(
            "test",
            WindowLimit::new(limit, window_ms),
            0.0,
            Arc::new(clock.clone()),
        )
    }

    #[test]
    fn test_allows_up_to_limit_then_rejects() {
        let clock = ManualClock::default();
        let limiter = limiter(3, 60_000, &clock);

        assert_eq!(limiter.check("k").unwrap().remaining, 2);
        assert_eq!(limiter.check("k").unwrap().remaining, 1);
        assert_eq!(limiter.check("k").unwrap().remaining, 0);

        let rejected = limiter.check("k").unwrap_err();
        assert_eq!(rejected.limit, 3);
        assert_eq!(rejected.retry_after_secs, 60);
    }

    #[test]
    fn test_retry_after_tracks_oldest_timestamp() {
        let clock = ManualClock::default();
        let limiter = limiter(2, 10_000, &clock);

        let first = limiter.check("k").unwrap();
        clock.advance(Duration::milliseconds(4_500));
        limiter.check("k").unwrap();

        let rejected = limiter.check("k").unwrap_err();
        // oldest + 10s - now = 5.5s, rounded up
        assert_eq!(rejected.retry_after_secs, 6);
        assert_eq!(rejected.reset_at, first.reset_at);
    }

    #[test]
    fn test_window_elapses_and_request_succeeds() {
        let clock = ManualClock::default();
        let limiter = limiter(1, 1_000, &clock);

        limiter.check("k").unwrap();
        assert!(limiter.check("k").is_err());

        clock.advance(Duration::milliseconds(1_000));
        assert!(limiter.check("k").is_ok());
    }

    #[test]
    fn test_retry_after_is_at_least_one_second() {
        let clock = ManualClock::default();
        let limiter = limiter(1, 1_000, &clock);

        limiter.check("k").unwrap();
        clock.advance(Duration::milliseconds(999));
        assert_eq!(limiter.check("k").unwrap_err().retry_after_secs, 1);
    }

    #[test]
    fn test_keys_are_independent_and_reset() {
        let clock = ManualClock::default();
        let limiter = limiter(1, 60_000, &clock);

        limiter.check("a").unwrap();
        limiter.check("b").unwrap();
        assert!(limiter.check("a").is_err());

        limiter.reset("a");
        assert!(limiter.check("a").is_ok());
    }

    #[test]
    fn test_sweep_drops_only_stale_keys() {
        let clock = ManualClock::default();
        let limiter = limiter(5, 1_000, &clock);

        limiter.check("old").unwrap();
        clock.advance(Duration::milliseconds(600));
        limiter.check("recent").unwrap();
        clock.advance(Duration::milliseconds(500));

        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn test_zero_limit_always_rejects() {
        let clock = ManualClock::default();
        let limiter = limiter(0, 2_000, &clock);
        assert_eq!(limiter.check("k").unwrap_err().retry_after_secs, 2);
    }

    #[test]
    fn test_login_scenario_sixth_attempt_rejected() {
        let clock = ManualClock::default();
        let limiter = limiter(5, 15 * 60 * 1000, &clock);

        for _ in 0..5 {
            limiter.check("203.0.113.5").unwrap();
            clock.advance(Duration::minutes(2));
        }
        let rejected = limiter.check("203.0.113.5").unwrap_err();
        assert!(rejected.retry_after_secs <= 900);
        assert_eq!(rejected.retry_after_secs, 300);
    }

    #[test]
    fn test_always_sweeping_limiter_keeps_live_key() {
        let clock = ManualClock::default();
        let limiter = RateLimiter::new(
            "sweepy",
            WindowLimit::new(2, 1_000),
            1.0,
            Arc::new(clock.clone()),
        );
        limiter.check("a").unwrap();
        clock.advance(Duration::seconds(2));
        limiter.check("b").unwrap();
        assert_eq!(limiter.len(), 1);
    }
}
