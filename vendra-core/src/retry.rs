use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{
    DropshipOrder, HealthReport, InventoryAck, InventoryUpdate, OrderCreation, ProductQuery,
    Provider, ProviderCategory, ProviderProduct, ShippingEstimate,
};

/// Backoff policy shared by every adapter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff with up to 25% jitter, capped at `max_delay`.
    fn backoff(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay);
        let jitter_ceiling = (exp.as_millis() as u64 / 4).max(1);
        let jitter = rand::thread_rng().gen_range(0..=jitter_ceiling);
        exp + Duration::from_millis(jitter)
    }
}

/// Run `op`, retrying retryable failures under `policy`.
///
/// A `RateLimited` error with a server-supplied `retry_after` takes priority
/// over computed backoff.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    op_name: &str,
    mut op: F,
) -> ProviderResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt + 1 < policy.max_attempts => {
                let delay = match &err {
                    ProviderError::RateLimited {
                        retry_after: Some(after),
                    } => (*after).min(policy.max_delay),
                    _ => policy.backoff(attempt),
                };
                tracing::warn!(
                    "{} failed on attempt {}: {}. Retrying in {:?}",
                    op_name,
                    attempt + 1,
                    err,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Decorator giving any adapter the shared retry behavior.
///
/// Only idempotent operations are retried. `create_order` is never retried:
/// a timed-out creation may have landed on the provider side, and the
/// dispatcher records the failure instead. `calculate_shipping` carries its
/// own fallback inside the adapter.
pub struct Retrying<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P> Retrying<P> {
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<P: Provider> Provider for Retrying<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn sku_prefix(&self) -> &str {
        self.inner.sku_prefix()
    }

    async fn check_health(&self) -> HealthReport {
        self.inner.check_health().await
    }

    async fn get_categories(&self) -> ProviderResult<Vec<ProviderCategory>> {
        with_retry(&self.policy, "get_categories", || self.inner.get_categories()).await
    }

    async fn fetch_products(&self, query: &ProductQuery) -> ProviderResult<Vec<ProviderProduct>> {
        with_retry(&self.policy, "fetch_products", || {
            self.inner.fetch_products(query)
        })
        .await
    }

    async fn create_order(&self, order: &DropshipOrder) -> ProviderResult<OrderCreation> {
        self.inner.create_order(order).await
    }

    async fn calculate_shipping(&self, order: &DropshipOrder) -> ProviderResult<ShippingEstimate> {
        self.inner.calculate_shipping(order).await
    }

    async fn update_inventory(&self, updates: &[InventoryUpdate]) -> ProviderResult<InventoryAck> {
        with_retry(&self.policy, "update_inventory", || {
            self.inner.update_inventory(updates)
        })
        .await
    }
}
