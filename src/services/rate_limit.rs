use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

const MAX_FAILURES: u32 = 5;
const WINDOW: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    failures: u32,
}

/// Failed sign-in attempts per email inside a fixed window.
#[derive(Debug)]
pub struct SignInLimiter {
    windows: DashMap<String, Window>,
    max_failures: u32,
    window: Duration,
}

impl Default for SignInLimiter {
    fn default() -> Self {
        Self::new(MAX_FAILURES, WINDOW)
    }
}

impl SignInLimiter {
    pub fn new(max_failures: u32, window: Duration) -> Self {
        Self { windows: DashMap::new(), max_failures, window }
    }

    pub fn is_blocked(&self, key: &str) -> bool {
        let now = Instant::now();
        match self.windows.get(key) {
            Some(w) => now.duration_since(w.started) < self.window && w.failures >= self.max_failures,
            None => false,
        }
    }

    pub fn record_failure(&self, key: &str) {
        let now = Instant::now();
        let mut w = self
            .windows
            .entry(key.to_string())
            .or_insert(Window { started: now, failures: 0 });

        if now.duration_since(w.started) >= self.window {
            *w = Window { started: now, failures: 0 };
        }
        w.failures += 1;
    }

    pub fn reset(&self, key: &str) {
        self.windows.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn blocks_after_max_failures_until_window_passes() {
        let limiter = SignInLimiter::new(2, Duration::from_secs(60));

        limiter.record_failure("a@example.com");
        assert!(!limiter.is_blocked("a@example.com"));
        limiter.record_failure("a@example.com");
        assert!(limiter.is_blocked("a@example.com"));
        assert!(!limiter.is_blocked("b@example.com"));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(!limiter.is_blocked("a@example.com"));

        limiter.record_failure("a@example.com");
        assert!(!limiter.is_blocked("a@example.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_clears_failures() {
        let limiter = SignInLimiter::new(1, Duration::from_secs(60));
        limiter.record_failure("a@example.com");
        assert!(limiter.is_blocked("a@example.com"));
        limiter.reset("a@example.com");
        assert!(!limiter.is_blocked("a@example.com"));
    }
}
