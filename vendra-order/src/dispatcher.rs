use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use uuid::Uuid;

use vendra_catalog::CatalogStore;
use vendra_core::provider::{DropshipOrder, DropshipOrderItem, ShippingEstimate};
use vendra_core::ProviderRegistry;

use crate::models::{ExternalOrderMapping, MappingStatus, MarketplaceOrder};
use crate::store::{OrderError, OrderMappingStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub provider: String,
    pub error: String,
}

/// Per-provider outcome of one dispatch call. A multi-supplier order can be
/// partially submitted; each group stands alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchReport {
    pub internal_order_id: Uuid,
    pub submitted: Vec<String>,
    pub failed: Vec<ProviderFailure>,
    /// Providers whose mapping already existed (non-failed); not re-sent.
    pub skipped: Vec<String>,
    /// Line items whose product could not be resolved.
    pub unresolved: Vec<Uuid>,
    pub shipping: HashMap<String, ShippingEstimate>,
}

/// Groups an order's dropship lines by provider and creates one
/// provider-side order per group, recording the external mapping.
pub struct OrderDispatcher {
    registry: Arc<ProviderRegistry>,
    catalog: Arc<dyn CatalogStore>,
    mappings: Arc<dyn OrderMappingStore>,
}

impl OrderDispatcher {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        catalog: Arc<dyn CatalogStore>,
        mappings: Arc<dyn OrderMappingStore>,
    ) -> Self {
        Self {
            registry,
            catalog,
            mappings,
        }
    }

    pub fn mappings(&self) -> Arc<dyn OrderMappingStore> {
        self.mappings.clone()
    }

    pub async fn dispatch(
        &self,
        tenant: &str,
        order: &MarketplaceOrder,
    ) -> Result<DispatchReport, OrderError> {
        if tenant.trim().is_empty() || tenant != order.tenant_id {
            return Err(OrderError::InvalidOrder(format!(
                "tenant mismatch: {} vs {}",
                tenant, order.tenant_id
            )));
        }

        let mut report = DispatchReport {
            internal_order_id: order.id,
            submitted: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
            unresolved: Vec::new(),
            shipping: HashMap::new(),
        };

        // Resolve each line to its provider through the catalog.
        let mut groups: HashMap<String, Vec<DropshipOrderItem>> = HashMap::new();
        for line in &order.lines {
            let product = match self.catalog.get_product(tenant, line.product_id).await {
                Ok(Some(product)) => product,
                Ok(None) => {
                    report.unresolved.push(line.product_id);
                    continue;
                }
                Err(err) => {
                    tracing::warn!("Product lookup failed for {}: {}", line.product_id, err);
                    report.unresolved.push(line.product_id);
                    continue;
                }
            };

            // First-party lines are not ours to dispatch.
            let Some((_, provider, external_id)) = product.source_key() else {
                continue;
            };

            groups
                .entry(provider.to_string())
                .or_default()
                .push(DropshipOrderItem {
                    external_product_id: external_id.to_string(),
                    sku: product.sku.clone(),
                    name: product.name.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                });
        }

        // Groups already submitted (or pending) stay untouched; only failed
        // ones are eligible for a retry.
        let existing = self.mappings.get_mappings(order.id).await?;
        let locked: Vec<String> = existing
            .iter()
            .filter(|m| m.status != MappingStatus::Failed)
            .map(|m| m.provider.clone())
            .collect();

        let mut workers = JoinSet::new();
        for (provider_name, items) in groups {
            if locked.contains(&provider_name) {
                report.skipped.push(provider_name);
                continue;
            }

            let dropship_order = DropshipOrder {
                internal_order_id: order.id,
                tenant_id: order.tenant_id.clone(),
                customer: order.customer.clone(),
                address: order.shipping_address.clone(),
                items,
            };
            workers.spawn(dispatch_group(
                self.registry.clone(),
                self.mappings.clone(),
                provider_name,
                dropship_order,
            ));
        }

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(outcome) => {
                    if let Some(estimate) = outcome.shipping {
                        report.shipping.insert(outcome.provider.clone(), estimate);
                    }
                    match outcome.result {
                        Ok(_external_order_id) => report.submitted.push(outcome.provider),
                        Err(error) => report.failed.push(ProviderFailure {
                            provider: outcome.provider,
                            error,
                        }),
                    }
                }
                Err(join_err) => {
                    tracing::error!("Dispatch worker panicked: {}", join_err);
                }
            }
        }

        report.submitted.sort();
        report.failed.sort_by(|a, b| a.provider.cmp(&b.provider));
        Ok(report)
    }
}

struct GroupOutcome {
    provider: String,
    shipping: Option<ShippingEstimate>,
    result: Result<String, String>,
}

/// One provider group: estimate shipping (best effort), create the order,
/// persist exactly one mapping. Never panics; the siblings keep going.
async fn dispatch_group(
    registry: Arc<ProviderRegistry>,
    mappings: Arc<dyn OrderMappingStore>,
    provider_name: String,
    dropship_order: DropshipOrder,
) -> GroupOutcome {
    let order_id = dropship_order.internal_order_id;

    let provider = match registry.get(&provider_name) {
        Ok(provider) => provider,
        Err(err) => {
            let reason = err.to_string();
            record_failure(&mappings, order_id, &provider_name, &reason).await;
            return GroupOutcome {
                provider: provider_name,
                shipping: None,
                result: Err(reason),
            };
        }
    };

    let shipping = match provider.calculate_shipping(&dropship_order).await {
        Ok(estimate) => Some(estimate),
        Err(err) => {
            tracing::warn!("Shipping estimate failed for {}: {}", provider_name, err);
            None
        }
    };

    match provider.create_order(&dropship_order).await {
        Ok(creation) => {
            let mapping = ExternalOrderMapping::submitted(
                order_id,
                &provider_name,
                creation.external_order_id.clone(),
                creation.payload,
            );
            if let Err(err) = mappings.insert_mapping(mapping).await {
                tracing::error!(
                    "Provider order {} created but mapping not stored: {}",
                    creation.external_order_id,
                    err
                );
                return GroupOutcome {
                    provider: provider_name,
                    shipping,
                    result: Err(err.to_string()),
                };
            }
            GroupOutcome {
                provider: provider_name,
                shipping,
                result: Ok(creation.external_order_id),
            }
        }
        Err(err) => {
            let reason = err.to_string();
            record_failure(&mappings, order_id, &provider_name, &reason).await;
            GroupOutcome {
                provider: provider_name,
                shipping,
                result: Err(reason),
            }
        }
    }
}

async fn record_failure(
    mappings: &Arc<dyn OrderMappingStore>,
    order_id: Uuid,
    provider: &str,
    reason: &str,
) {
    let mapping = ExternalOrderMapping::failed(order_id, provider, reason);
    if let Err(err) = mappings.insert_mapping(mapping).await {
        tracing::error!("Failed to record failure mapping for {}: {}", provider, err);
    }
}
