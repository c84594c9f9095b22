//! Per-connection message rate limiting.
//!
//! Each WebSocket connection owns a [`MessageLimiter`]: a short burst window
//! layered over a longer sustained window.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::WsLimits;

/// Sliding window rate limiter
#[derive(Debug)]
pub struct RateLimiter {
    /// Timestamps of recent requests
    timestamps: VecDeque<Instant>,
    /// Maximum number of requests allowed in the window
    max_requests: usize,
    /// Time window for rate limiting
    window: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Example
    ///
    /// ```
    /// use mao_server::api::rate_limiter::RateLimiter;
    /// use std::time::Duration;
    ///
    /// let mut limiter = RateLimiter::new(2, Duration::from_secs(1));
    /// assert!(limiter.check());
    /// assert!(limiter.check());
    /// assert!(!limiter.check());
    /// ```
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_requests),
            max_requests,
            window,
        }
    }

    /// Returns `true` and records the request if it fits in the window.
    pub fn check(&mut self) -> bool {
        self.check_at(Instant::now())
    }

    fn check_at(&mut self, now: Instant) -> bool {
        while let Some(ts) = self.timestamps.front() {
            if now.duration_since(*ts) > self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }

        if self.timestamps.len() >= self.max_requests {
            return false;
        }

        self.timestamps.push_back(now);
        true
    }

    /// Time until the oldest request leaves the window.
    pub fn reset_in(&self) -> Option<Duration> {
        self.timestamps.front().map(|oldest| {
            let elapsed = Instant::now().duration_since(*oldest);
            self.window.saturating_sub(elapsed)
        })
    }
}

/// Which window rejected a message
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LimitExceeded {
    Burst,
    Sustained,
}

impl LimitExceeded {
    pub fn label(self) -> &'static str {
        match self {
            Self::Burst => "burst",
            Self::Sustained => "sustained",
        }
    }
}

/// Burst (per second) and sustained (per minute) limits for one connection
#[derive(Debug)]
pub struct MessageLimiter {
    burst: RateLimiter,
    sustained: RateLimiter,
}

impl MessageLimiter {
    pub fn new(limits: WsLimits) -> Self {
        Self {
            burst: RateLimiter::new(limits.burst, Duration::from_secs(1)),
            sustained: RateLimiter::new(limits.sustained, Duration::from_secs(60)),
        }
    }

    /// Admit one message or report which limit it exceeded.
    pub fn check(&mut self) -> Result<(), LimitExceeded> {
        if !self.burst.check() {
            return Err(LimitExceeded::Burst);
        }
        if !self.sustained.check() {
            return Err(LimitExceeded::Sustained);
        }
        Ok(())
    }

    /// Suggested wait before retrying after `exceeded`.
    pub fn retry_after(&self, exceeded: LimitExceeded) -> Duration {
        let limiter = match exceeded {
            LimitExceeded::Burst => &self.burst,
            LimitExceeded::Sustained => &self.sustained,
        };
        limiter.reset_in().unwrap_or_default()
    }
}
