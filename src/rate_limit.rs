use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

pub const WINDOW: Duration = Duration::from_secs(15 * 60);
const MAX_FAILURES: u32 = 5;

/// Per-email login brute force limiter.
#[derive(Default)]
pub struct LoginRateLimiter {
    /// email -> (failed_count, window_start)
    entries: DashMap<String, (u32, Instant)>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 5 failures per 15 minutes. Returns the seconds left in the window when blocked.
    /// Does not count the attempt; call `record_failure` on a bad password.
    pub fn check(&self, email: &str) -> Result<(), u64> {
        let now = Instant::now();
        let Some(entry) = self.entries.get(&email.to_lowercase()) else {
            return Ok(());
        };
        let (count, start) = entry.value();

        if now.duration_since(*start) > WINDOW {
            return Ok(());
        }
        if *count >= MAX_FAILURES {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(WINDOW.as_secs().saturating_sub(elapsed));
        }
        Ok(())
    }

    pub fn record_failure(&self, email: &str) {
        let now = Instant::now();
        let mut entry = self.entries.entry(email.to_lowercase()).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > WINDOW {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    /// Forget an address after a successful login.
    pub fn clear(&self, email: &str) {
        self.entries.remove(&email.to_lowercase());
    }

    /// Drop entries whose window started more than `max_age` ago.
    pub fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.entries.retain(|_, (_, start)| now.duration_since(*start) < max_age);
    }

    pub fn tracked(&self) -> usize {
        self.entries.len()
    }
}

/// Sweep expired login windows once per window for as long as the runtime lives.
pub fn spawn_cleanup(limiter: Arc<LoginRateLimiter>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(WINDOW);
        loop {
            ticker.tick().await;
            let before = limiter.tracked();
            limiter.cleanup(WINDOW);
            tracing::debug!(
                evicted = before.saturating_sub(limiter.tracked()),
                "Swept login rate limiter"
            );
        }
    });
}
