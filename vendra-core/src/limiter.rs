use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};

/// A token bucket: `refill_per_sec` tokens accrue continuously up to
/// `capacity`; each provider request takes one token.
pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(capacity: u32, refill_per_sec: f64) -> Self {
        let capacity = capacity.max(1) as f64;
        Self {
            capacity,
            refill_per_sec: refill_per_sec.max(f64::EPSILON),
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Wait until a token is available, then take it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let elapsed = state.last_refill.elapsed().as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
                state.last_refill = Instant::now();

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                Duration::from_secs_f64((1.0 - state.tokens) / self.refill_per_sec)
            };
            sleep(wait).await;
        }
    }
}

/// Hands out one shared bucket per `(tenant, provider)` pair so concurrent
/// import tasks for the same pair stay under the provider's request ceiling.
pub struct RateLimiterPool {
    requests_per_minute: u32,
    burst: u32,
    buckets: Mutex<HashMap<String, Arc<TokenBucket>>>,
}

impl RateLimiterPool {
    pub fn new(requests_per_minute: u32, burst: u32) -> Self {
        Self {
            requests_per_minute: requests_per_minute.max(1),
            burst: burst.max(1),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub async fn bucket(&self, tenant: &str, provider: &str) -> Arc<TokenBucket> {
        let key = format!("{}/{}", tenant, provider);
        let mut buckets = self.buckets.lock().await;
        buckets
            .entry(key)
            .or_insert_with(|| {
                Arc::new(TokenBucket::new(
                    self.burst,
                    self.requests_per_minute as f64 / 60.0,
                ))
            })
            .clone()
    }
}
