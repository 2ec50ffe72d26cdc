//! Client-side request throttling for the metadata provider.

use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};

/// Token bucket refilled continuously at a fixed per-second rate.
///
/// The bucket starts full, allowing a burst up to its capacity.
#[derive(Debug)]
pub struct TokenBucket {
    /// Max tokens (= requests per second).
    capacity: f32,
    tokens: f32,
    /// Tokens added per second.
    refill_rate: f32,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(requests_per_second: u32) -> Self {
        let capacity = requests_per_second.max(1) as f32;
        Self {
            capacity,
            tokens: capacity,
            refill_rate: capacity,
            last_refill: Instant::now(),
        }
    }

    /// Take a token, or return how long to wait until one is available.
    pub fn try_acquire(&mut self) -> Result<(), Duration> {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let tokens_needed = 1.0 - self.tokens;
            Err(Duration::from_secs_f32(tokens_needed / self.refill_rate))
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f32();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }
}

/// Async wrapper that waits for a token instead of failing.
#[derive(Debug)]
pub struct Throttle {
    bucket: Mutex<TokenBucket>,
}

impl Throttle {
    pub fn new(requests_per_second: u32) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(requests_per_second)),
        }
    }

    /// Wait until a request may be sent.
    pub async fn acquire(&self) {
        loop {
            let wait = match self.bucket.lock().await.try_acquire() {
                Ok(()) => return,
                Err(wait) => wait,
            };
            sleep(wait).await;
        }
    }
}
