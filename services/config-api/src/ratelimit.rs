//! Advisory per-IP rate limiting.
//!
//! A fixed-window counter map held inside `AppState` and constructed
//! once per process. It is a courtesy throttle, not a security boundary:
//! state is lost on restart and not shared between instances, which is
//! acceptable drift.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::handlers::common::ApiError;
use crate::state::AppState;

/// Tracked IPs above this count trigger an eviction sweep of expired
/// windows before inserting new ones.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by client IP.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    limit: u32,
    window: Duration,
    counters: Mutex<HashMap<IpAddr, Window>>,
}

/// Returned when a window is exhausted; carries the hint for the
/// `Retry-After` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitExceeded {
    pub retry_after_secs: u64,
}

impl FixedWindowLimiter {
    /// Limiter with the standard one-minute window. A limit of 0
    /// disables throttling.
    pub fn new(limit: u32) -> Self {
        Self::with_window(limit, Duration::from_secs(60))
    }

    pub fn with_window(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Count a request from `ip` against the current window.
    pub fn check(&self, ip: IpAddr) -> Result<(), RateLimitExceeded> {
        if self.limit == 0 {
            return Ok(());
        }

        let now = Instant::now();
        let mut counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if counters.len() > PRUNE_THRESHOLD {
            let window = self.window;
            counters.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = counters.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        entry.count += 1;
        if entry.count > self.limit {
            let elapsed = now.duration_since(entry.started);
            let retry_after_secs = self.window.saturating_sub(elapsed).as_secs() + 1;
            return Err(RateLimitExceeded { retry_after_secs });
        }

        Ok(())
    }

    /// Number of currently tracked client IPs.
    pub fn tracked_ips(&self) -> usize {
        self.counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

/// Per-IP rate limiting middleware for the public API routes.
pub async fn ip_rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    metrics::counter!("api_requests_total").increment(1);

    match state.limiter.check(addr.ip()) {
        Ok(()) => next.run(req).await,
        Err(e) => {
            state.metrics.rate_limited.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(ip = %addr.ip(), retry_after = e.retry_after_secs, "Rate limited");
            ApiError::rate_limited(e.retry_after_secs).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([127, 0, 0, last])
    }

    #[test]
    fn test_allows_up_to_limit() {
        let limiter = FixedWindowLimiter::new(5);
        for _ in 0..5 {
            assert!(limiter.check(ip(1)).is_ok());
        }
        assert!(limiter.check(ip(1)).is_err());
    }

    #[test]
    fn test_ips_counted_independently() {
        let limiter = FixedWindowLimiter::new(2);
        assert!(limiter.check(ip(1)).is_ok());
        assert!(limiter.check(ip(1)).is_ok());
        assert!(limiter.check(ip(1)).is_err());
        assert!(limiter.check(ip(2)).is_ok());
        assert_eq!(limiter.tracked_ips(), 2);
    }

    #[test]
    fn test_window_resets() {
        let limiter = FixedWindowLimiter::with_window(1, Duration::from_millis(20));
        assert!(limiter.check(ip(1)).is_ok());
        assert!(limiter.check(ip(1)).is_err());

        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.check(ip(1)).is_ok());
    }

    #[test]
    fn test_retry_after_bounded_by_window() {
        let limiter = FixedWindowLimiter::with_window(1, Duration::from_secs(60));
        let _ = limiter.check(ip(1));
        let err = limiter.check(ip(1)).unwrap_err();
        assert!(err.retry_after_secs >= 1);
        assert!(err.retry_after_secs <= 61);
    }

    #[test]
    fn test_zero_limit_disables() {
        let limiter = FixedWindowLimiter::new(0);
        for _ in 0..200 {
            assert!(limiter.check(ip(1)).is_ok());
        }
        assert_eq!(limiter.tracked_ips(), 0);
    }
}
