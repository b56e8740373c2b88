use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use vendra_shared::retail_round;

/// Multiplier applied to supplier prices to derive the tenant-facing retail
/// price. Supplier data never reaches a product record without it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkupPolicy {
    factor: Decimal,
}

impl Default for MarkupPolicy {
    fn default() -> Self {
        // 1.3
        Self {
            factor: Decimal::new(13, 1),
        }
    }
}

impl MarkupPolicy {
    pub fn new(factor: Decimal) -> Self {
        Self { factor }
    }

    pub fn factor(&self) -> Decimal {
        self.factor
    }

    /// Supplier price → retail price, rounded to 2 dp.
    pub fn retail(&self, supplier_price: Decimal) -> Decimal {
        retail_round(supplier_price * self.factor)
    }
}
