use std::sync::Arc;

use chrono::Utc;

use vendra_catalog::{CatalogStore, MarkupPolicy, SyncRunStore};
use vendra_core::limiter::RateLimiterPool;
use vendra_core::provider::ProductQuery;
use vendra_core::ProviderRegistry;

use crate::cancel::CancelToken;
use crate::importer::ImportError;
use crate::summary::{ReconcileSummary, SkippedProduct};

/// Per-run reconciliation options.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    /// Only refresh products last updated before this window, so periodic
    /// runs touch the stale tail instead of rescanning the whole catalog.
    pub refresh_older_than: Option<chrono::Duration>,
}

/// Refreshes price and stock for previously imported dropship products.
///
/// Products whose provider lookup fails are skipped and reported, never
/// deleted or zeroed: stale-but-present data beats destructive failure.
pub struct InventoryReconciler {
    registry: Arc<ProviderRegistry>,
    catalog: Arc<dyn CatalogStore>,
    sync_runs: Arc<dyn SyncRunStore>,
    limiter: Arc<RateLimiterPool>,
    markup: MarkupPolicy,
}

impl InventoryReconciler {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        catalog: Arc<dyn CatalogStore>,
        sync_runs: Arc<dyn SyncRunStore>,
        limiter: Arc<RateLimiterPool>,
        markup: MarkupPolicy,
    ) -> Self {
        Self {
            registry,
            catalog,
            sync_runs,
            limiter,
            markup,
        }
    }

    pub async fn reconcile(
        &self,
        tenant: &str,
        provider_name: &str,
        opts: &ReconcileOptions,
        cancel: &CancelToken,
    ) -> Result<ReconcileSummary, ImportError> {
        if tenant.trim().is_empty() {
            return Err(ImportError::InvalidTenant);
        }

        let mut summary = ReconcileSummary::new(tenant, provider_name);
        let cutoff = opts.refresh_older_than.map(|age| Utc::now() - age);

        let products = self
            .catalog
            .list_dropship_products(tenant, provider_name)
            .await
            .unwrap_or_default();

        let provider = match self.registry.get(provider_name) {
            Ok(provider) => provider,
            Err(err) => {
                tracing::warn!("Reconcile skipped, {}", err);
                for product in products {
                    summary.skipped.push(SkippedProduct {
                        product_id: product.id,
                        external_id: product.dropship_product_id.clone(),
                        reason: "provider unconfigured".to_string(),
                    });
                }
                summary.finished_at = Some(Utc::now());
                return Ok(summary);
            }
        };

        let bucket = self.limiter.bucket(tenant, provider_name).await;

        for product in products {
            if cancel.is_cancelled() {
                break;
            }

            if let Some(cutoff) = cutoff {
                if product.updated_at > cutoff {
                    summary.already_fresh += 1;
                    continue;
                }
            }

            let external_id = match &product.dropship_product_id {
                Some(id) => id.clone(),
                None => {
                    summary.skipped.push(SkippedProduct {
                        product_id: product.id,
                        external_id: None,
                        reason: "missing external product id".to_string(),
                    });
                    continue;
                }
            };

            bucket.acquire().await;
            let lookup = provider
                .fetch_products(&ProductQuery::by_keyword(external_id.clone(), 1, 10))
                .await;

            let refreshed = match lookup {
                Ok(items) => items.into_iter().find(|item| item.id == external_id),
                Err(err) => {
                    summary.skipped.push(SkippedProduct {
                        product_id: product.id,
                        external_id: Some(external_id),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            let Some(item) = refreshed else {
                summary.skipped.push(SkippedProduct {
                    product_id: product.id,
                    external_id: Some(external_id),
                    reason: "not present in provider response".to_string(),
                });
                continue;
            };

            let mut updated = product.clone();
            let retail = self.markup.retail(item.price);
            updated.price = retail;
            updated.list_price = retail;
            updated.inventory.set_quantity(item.stock);
            updated.updated_at = Utc::now();

            match self.catalog.upsert_dropship_product(updated).await {
                Ok(_) => summary.refreshed += 1,
                Err(err) => summary.skipped.push(SkippedProduct {
                    product_id: product.id,
                    external_id: product.dropship_product_id.clone(),
                    reason: err.to_string(),
                }),
            }
        }

        if !cancel.is_cancelled() {
            if let Err(err) = self
                .sync_runs
                .record_inventory_sync(tenant, provider_name, Utc::now())
                .await
            {
                tracing::warn!("Failed to record reconcile run: {}", err);
            }
        }

        summary.finished_at = Some(Utc::now());
        Ok(summary)
    }
}
