use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use vendra_core::provider::{OrderAddress, OrderCustomer};

/// Status of a provider-side order mapping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MappingStatus {
    Pending,
    Submitted,
    Failed,
}

impl MappingStatus {
    /// Valid transitions: a mapping is immutable once it leaves `Pending`,
    /// except that provider webhooks may still fail a submitted order.
    pub fn can_transition_to(self, next: MappingStatus) -> bool {
        matches!(
            (self, next),
            (MappingStatus::Pending, MappingStatus::Submitted)
                | (MappingStatus::Pending, MappingStatus::Failed)
                | (MappingStatus::Submitted, MappingStatus::Failed)
        )
    }
}

/// Links one provider group of an internal order to the provider-side order.
/// Exactly one per (internal order, provider).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalOrderMapping {
    pub internal_order_id: Uuid,
    pub provider: String,
    pub external_order_id: Option<String>,
    pub status: MappingStatus,
    /// Opaque snapshot of the provider's response.
    pub provider_payload: Value,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExternalOrderMapping {
    pub fn submitted(
        internal_order_id: Uuid,
        provider: impl Into<String>,
        external_order_id: impl Into<String>,
        payload: Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            internal_order_id,
            provider: provider.into(),
            external_order_id: Some(external_order_id.into()),
            status: MappingStatus::Submitted,
            provider_payload: payload,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn failed(internal_order_id: Uuid, provider: impl Into<String>, error: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            internal_order_id,
            provider: provider.into(),
            external_order_id: None,
            status: MappingStatus::Failed,
            provider_payload: Value::Null,
            error: Some(error.into()),
            created_at: now,
            updated_at: now,
        }
    }
}

/// One line of an internal order, as handed over by the checkout
/// collaborator. The dispatcher resolves the product to find its provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// An internal order containing (possibly) dropship line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceOrder {
    pub id: Uuid,
    pub tenant_id: String,
    pub customer: OrderCustomer,
    pub shipping_address: OrderAddress,
    pub lines: Vec<OrderLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_matrix() {
        assert!(MappingStatus::Pending.can_transition_to(MappingStatus::Submitted));
        assert!(MappingStatus::Pending.can_transition_to(MappingStatus::Failed));
        assert!(MappingStatus::Submitted.can_transition_to(MappingStatus::Failed));

        assert!(!MappingStatus::Submitted.can_transition_to(MappingStatus::Pending));
        assert!(!MappingStatus::Failed.can_transition_to(MappingStatus::Submitted));
        assert!(!MappingStatus::Failed.can_transition_to(MappingStatus::Pending));
    }
}
