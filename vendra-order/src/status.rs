use std::sync::Arc;

use crate::models::MappingStatus;
use crate::store::{OrderError, OrderMappingStore};

/// Entry point for the inbound webhook collaborator: provider-keyed order
/// status updates land here and are validated before they touch a mapping.
pub struct OrderStatusService {
    mappings: Arc<dyn OrderMappingStore>,
}

impl OrderStatusService {
    pub fn new(mappings: Arc<dyn OrderMappingStore>) -> Self {
        Self { mappings }
    }

    pub async fn update_external_order_status(
        &self,
        provider: &str,
        external_order_id: &str,
        new_status: MappingStatus,
    ) -> Result<(), OrderError> {
        self.mappings
            .update_status(provider, external_order_id, new_status)
            .await?;
        tracing::info!(
            "Order mapping {}/{} moved to {:?}",
            provider,
            external_order_id,
            new_status
        );
        Ok(())
    }
}
