pub mod dispatcher;
pub mod models;
pub mod status;
pub mod store;

pub use dispatcher::{DispatchReport, OrderDispatcher};
pub use models::{ExternalOrderMapping, MappingStatus, MarketplaceOrder, OrderLine};
pub use status::OrderStatusService;
pub use store::{MemoryOrderMappings, OrderError, OrderMappingStore};
