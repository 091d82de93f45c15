use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

pub const DEFAULT_MAX_REQUESTS: u32 = 30;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct WindowCounter {
    count: u32,
    window_start: Instant,
}

/// Fixed-window request counter keyed by client identity.
/// A client's window starts with its first request and resets once `window`
/// has elapsed since then.
pub struct RateLimiter {
    entries: Mutex<HashMap<String, WindowCounter>>,
    max_requests: u32,
    window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Counts a request and returns true if it is within the limit.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut entries = self.entries.lock();

        let counter = entries.entry(key.to_string()).or_insert(WindowCounter {
            count: 0,
            window_start: now,
        });

        if now.saturating_duration_since(counter.window_start) >= self.window {
            counter.count = 0;
            counter.window_start = now;
        }

        if counter.count < self.max_requests {
            counter.count += 1;
            true
        } else {
            false
        }
    }

    /// Drops counters whose window has expired.
    pub fn prune(&self) {
        self.prune_at(Instant::now());
    }

    pub fn prune_at(&self, now: Instant) {
        let window = self.window;
        self.entries
            .lock()
            .retain(|_, counter| now.saturating_duration_since(counter.window_start) < window);
    }

    pub fn tracked_clients(&self) -> usize {
        self.entries.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirty_first_request_in_window_is_rejected() {
        let limiter = RateLimiter::default();
        let start = Instant::now();

        for i in 0..30 {
            let now = start + Duration::from_secs(i);
            assert!(limiter.check_at("1.2.3.4", now), "request {} rejected", i + 1);
        }
        assert!(!limiter.check_at("1.2.3.4", start + Duration::from_secs(59)));
    }

    #[test]
    fn clients_are_counted_separately() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check_at("a", now));
        assert!(limiter.check_at("a", now));
        assert!(!limiter.check_at("a", now));
        assert!(limiter.check_at("b", now));
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check_at("a", start));
        assert!(!limiter.check_at("a", start + Duration::from_secs(59)));
        assert!(limiter.check_at("a", start + Duration::from_secs(60)));
        assert!(!limiter.check_at("a", start + Duration::from_secs(61)));
    }

    #[test]
    fn prune_drops_expired_counters() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        let start = Instant::now();

        limiter.check_at("old", start);
        limiter.check_at("new", start + Duration::from_secs(30));
        assert_eq!(limiter.tracked_clients(), 2);

        limiter.prune_at(start + Duration::from_secs(61));
        assert_eq!(limiter.tracked_clients(), 1);
    }
}
