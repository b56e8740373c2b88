use std::sync::Arc;

use vendra_catalog::CatalogStore;
use vendra_core::ProviderRegistry;
use vendra_import::{CatalogImporter, InventoryReconciler};
use vendra_order::{OrderDispatcher, OrderStatusService};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ProviderRegistry>,
    pub catalog: Arc<dyn CatalogStore>,
    pub importer: Arc<CatalogImporter>,
    pub reconciler: Arc<InventoryReconciler>,
    pub dispatcher: Arc<OrderDispatcher>,
    pub order_status: Arc<OrderStatusService>,
}
