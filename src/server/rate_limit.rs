//! Fixed-window rate limiting keyed by client address.
//!
//! Each address gets a counter that starts with its first request and
//! lives for exactly one window. The counter sits in a moka cache whose
//! time-to-live equals the window, so expiry *is* the window reset: once
//! the entry is gone the next request opens a fresh window at zero.
//!
//! Lookups never refresh the TTL (`time_to_live`, not `time_to_idle`),
//! which keeps the window fixed rather than sliding.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use moka::future::Cache;

use crate::telemetry;

/// Message returned to clients that exceed the limit.
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later";

/// Upper bound on tracked addresses.
const MAX_TRACKED_CLIENTS: u64 = 100_000;

/// Rate limiter configuration.
///
/// ```rust
/// # use flora::server::rate_limit::RateLimitConfig;
/// # use std::time::Duration;
/// let config = RateLimitConfig::new()
///     .max_requests(100)
///     .window(Duration::from_secs(15 * 60));
/// ```
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests allowed per address per window. Default: 100.
    pub max_requests: u32,
    /// Window length. Default: 15 minutes.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
        }
    }
}

impl RateLimitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_requests(mut self, n: u32) -> Self {
        self.max_requests = n;
        self
    }

    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed {
        limit: u32,
        remaining: u32,
    },
    Rejected {
        limit: u32,
        /// Time until the current window closes.
        retry_after: Duration,
    },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }
}

#[derive(Debug)]
struct Window {
    started: Instant,
    hits: AtomicU32,
}

/// Process-wide request counter shared by all handlers.
#[derive(Clone)]
pub struct RateLimiter {
    windows: Cache<IpAddr, Arc<Window>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let windows = Cache::builder()
            .max_capacity(MAX_TRACKED_CLIENTS)
            .time_to_live(config.window)
            .build();
        Self { windows, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count a request from `addr` and decide whether it may proceed.
    pub async fn check(&self, addr: IpAddr) -> Decision {
        let window = self
            .windows
            .get_with(addr, async {
                Arc::new(Window {
                    started: Instant::now(),
                    hits: AtomicU32::new(0),
                })
            })
            .await;

        let limit = self.config.max_requests;
        let hits = window.hits.fetch_add(1, Ordering::Relaxed).saturating_add(1);

        if hits <= limit {
            Decision::Allowed {
                limit,
                remaining: limit - hits,
            }
        } else {
            metrics::counter!(telemetry::RATE_LIMITED_TOTAL).increment(1);
            Decision::Rejected {
                limit,
                retry_after: self.config.window.saturating_sub(window.started.elapsed()),
            }
        }
    }
}
