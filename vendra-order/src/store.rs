use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{ExternalOrderMapping, MappingStatus};

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Mapping not found: {0}")]
    NotFound(String),

    #[error("Mapping already exists for order {order_id} and provider {provider}")]
    Duplicate { order_id: Uuid, provider: String },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Storage failure: {0}")]
    Storage(String),
}

/// Store for external order mappings, keyed by (internal order, provider).
#[async_trait]
pub trait OrderMappingStore: Send + Sync {
    /// Insert a new mapping. At most one per (internal order, provider); a
    /// second insert for the same key is a `Duplicate` error, except that a
    /// `Failed` mapping may be replaced when the group is re-dispatched.
    async fn insert_mapping(&self, mapping: ExternalOrderMapping) -> Result<(), OrderError>;

    async fn get_mappings(
        &self,
        internal_order_id: Uuid,
    ) -> Result<Vec<ExternalOrderMapping>, OrderError>;

    async fn find_by_external(
        &self,
        provider: &str,
        external_order_id: &str,
    ) -> Result<Option<ExternalOrderMapping>, OrderError>;

    /// Apply a webhook-driven status change to the mapping identified by
    /// provider + external order id.
    async fn update_status(
        &self,
        provider: &str,
        external_order_id: &str,
        status: MappingStatus,
    ) -> Result<(), OrderError>;
}

#[derive(Default)]
pub struct MemoryOrderMappings {
    mappings: RwLock<HashMap<(Uuid, String), ExternalOrderMapping>>,
}

impl MemoryOrderMappings {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderMappingStore for MemoryOrderMappings {
    async fn insert_mapping(&self, mapping: ExternalOrderMapping) -> Result<(), OrderError> {
        let mut mappings = self.mappings.write().await;
        let key = (mapping.internal_order_id, mapping.provider.clone());
        if let Some(existing) = mappings.get(&key) {
            if existing.status != MappingStatus::Failed {
                return Err(OrderError::Duplicate {
                    order_id: mapping.internal_order_id,
                    provider: mapping.provider,
                });
            }
        }
        mappings.insert(key, mapping);
        Ok(())
    }

    async fn get_mappings(
        &self,
        internal_order_id: Uuid,
    ) -> Result<Vec<ExternalOrderMapping>, OrderError> {
        let mappings = self.mappings.read().await;
        let mut found: Vec<ExternalOrderMapping> = mappings
            .values()
            .filter(|m| m.internal_order_id == internal_order_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.provider.cmp(&b.provider));
        Ok(found)
    }

    async fn find_by_external(
        &self,
        provider: &str,
        external_order_id: &str,
    ) -> Result<Option<ExternalOrderMapping>, OrderError> {
        let mappings = self.mappings.read().await;
        Ok(mappings
            .values()
            .find(|m| {
                m.provider == provider && m.external_order_id.as_deref() == Some(external_order_id)
            })
            .cloned())
    }

    async fn update_status(
        &self,
        provider: &str,
        external_order_id: &str,
        status: MappingStatus,
    ) -> Result<(), OrderError> {
        let mut mappings = self.mappings.write().await;
        let mapping = mappings
            .values_mut()
            .find(|m| {
                m.provider == provider && m.external_order_id.as_deref() == Some(external_order_id)
            })
            .ok_or_else(|| {
                OrderError::NotFound(format!("{}/{}", provider, external_order_id))
            })?;

        if !mapping.status.can_transition_to(status) {
            return Err(OrderError::InvalidTransition {
                from: format!("{:?}", mapping.status),
                to: format!("{:?}", status),
            });
        }

        mapping.status = status;
        mapping.updated_at = chrono::Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_duplicate_mapping_is_rejected() {
        let store = MemoryOrderMappings::new();
        let order_id = Uuid::new_v4();

        store
            .insert_mapping(ExternalOrderMapping::submitted(
                order_id,
                "alibaba",
                "AE-1",
                json!({}),
            ))
            .await
            .unwrap();

        let duplicate = store
            .insert_mapping(ExternalOrderMapping::submitted(
                order_id,
                "alibaba",
                "AE-2",
                json!({}),
            ))
            .await;
        assert!(matches!(duplicate, Err(OrderError::Duplicate { .. })));

        // Same order, different provider is fine.
        store
            .insert_mapping(ExternalOrderMapping::failed(order_id, "acme", "boom"))
            .await
            .unwrap();
        assert_eq!(store.get_mappings(order_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_status_validates_transition() {
        let store = MemoryOrderMappings::new();
        let order_id = Uuid::new_v4();
        store
            .insert_mapping(ExternalOrderMapping::submitted(
                order_id,
                "alibaba",
                "AE-1",
                json!({}),
            ))
            .await
            .unwrap();

        // Submitted → Failed is webhook-allowed.
        store
            .update_status("alibaba", "AE-1", MappingStatus::Failed)
            .await
            .unwrap();

        // Failed → Submitted is not.
        let result = store
            .update_status("alibaba", "AE-1", MappingStatus::Submitted)
            .await;
        assert!(matches!(result, Err(OrderError::InvalidTransition { .. })));
    }
}
