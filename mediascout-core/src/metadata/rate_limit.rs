//! Client-side rate limiting for the metadata service.
//!
//! One [`RateLimiter`] is shared by every concurrent lookup so the request
//! ceiling holds for the whole process, not per caller.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// At most `limit` requests in any rolling `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    /// Requests allowed per window.
    pub limit: u32,
    /// Length of the rolling window.
    pub window: Duration,
}

impl Default for RateLimitRule {
    fn default() -> Self {
        Self {
            limit: 40,
            window: Duration::from_secs(10),
        }
    }
}

/// Result of asking the window for a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The request may go now.
    Granted,
    /// Try again after this long.
    Wait(Duration),
}

/// Sliding-window log of granted requests.
#[derive(Debug)]
pub struct SlidingWindow {
    rule: RateLimitRule,
    grants: VecDeque<Instant>,
    blocked_until: Option<Instant>,
}

impl SlidingWindow {
    /// An empty window. A zero limit is raised to one.
    pub fn new(rule: RateLimitRule) -> Self {
        Self {
            rule: RateLimitRule {
                limit: rule.limit.max(1),
                window: rule.window,
            },
            grants: VecDeque::new(),
            blocked_until: None,
        }
    }

    /// The rule in force.
    pub fn rule(&self) -> RateLimitRule {
        self.rule
    }

    /// Record a request at `now` if the window has room.
    pub fn try_acquire(&mut self, now: Instant) -> Admission {
        if let Some(until) = self.blocked_until {
            if now < until {
                return Admission::Wait(until - now);
            }
            self.blocked_until = None;
        }

        self.evict(now);
        if self.grants.len() < self.rule.limit as usize {
            self.grants.push_back(now);
            return Admission::Granted;
        }

        match self.grants.front() {
            Some(oldest) => Admission::Wait(*oldest + self.rule.window - now),
            None => Admission::Granted,
        }
    }

    /// Refuse every request until `until`, e.g. after the service said 429.
    pub fn block_until(&mut self, until: Instant) {
        self.blocked_until = Some(self.blocked_until.map_or(until, |b| b.max(until)));
    }

    /// End of the current penalty, if any.
    pub fn blocked_until(&self) -> Option<Instant> {
        self.blocked_until
    }

    /// Requests granted within the window ending at `now`.
    pub fn in_window(&mut self, now: Instant) -> usize {
        self.evict(now);
        self.grants.len()
    }

    fn evict(&mut self, now: Instant) {
        while let Some(oldest) = self.grants.front() {
            if *oldest + self.rule.window <= now {
                self.grants.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Current limiter usage, for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    /// Requests allowed per window.
    pub limit: u32,
    /// Length of the rolling window.
    pub window: Duration,
    /// Requests counted in the current window.
    pub in_window: usize,
    /// Remaining penalty after a 429.
    pub blocked_for: Option<Duration>,
}

/// Shared, cloneable handle to one sliding window.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    window: Arc<Mutex<SlidingWindow>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitRule::default())
    }
}

impl RateLimiter {
    /// A limiter with its own window.
    pub fn new(rule: RateLimitRule) -> Self {
        Self {
            window: Arc::new(Mutex::new(SlidingWindow::new(rule))),
        }
    }

    /// Wait until a request may be sent, then record it.
    pub async fn acquire(&self) {
        loop {
            let admission = self.window.lock().await.try_acquire(Instant::now());
            match admission {
                Admission::Granted => return,
                Admission::Wait(delay) => {
                    debug!("Rate limit reached, waiting {:?}", delay);
                    sleep(delay).await;
                }
            }
        }
    }

    /// Block all callers for `delay`.
    pub async fn penalize(&self, delay: Duration) {
        let until = Instant::now() + delay;
        self.window.lock().await.block_until(until);
    }

    /// Current usage without taking a slot.
    pub async fn snapshot(&self) -> RateLimitSnapshot {
        let now = Instant::now();
        let mut window = self.window.lock().await;
        let rule = window.rule();
        RateLimitSnapshot {
            limit: rule.limit,
            window: rule.window,
            in_window: window.in_window(now),
            blocked_for: window
                .blocked_until()
                .filter(|until| *until > now)
                .map(|until| until - now),
        }
    }
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay after the first failure.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Delay after the `failures`-th failed attempt.
    pub fn delay_for(&self, failures: u32) -> Duration {
        backoff::exponential(self.base_delay, failures, self.max_delay)
    }
}

/// Backoff curves.
pub mod backoff {
    use super::*;

    /// `base * 2^(failures - 1)`, capped at `max`.
    pub fn exponential(base: Duration, failures: u32, max: Duration) -> Duration {
        let multiplier = 2_u32.saturating_pow(failures.saturating_sub(1));
        base.saturating_mul(multiplier).min(max)
    }
}
