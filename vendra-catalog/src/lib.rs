pub mod category;
pub mod defaults;
pub mod markup;
pub mod product;
pub mod store;
pub mod sync;

pub use category::{rebuild_hierarchy, Category};
pub use markup::MarkupPolicy;
pub use product::{Inventory, Product, ProductVariant};
pub use store::{CatalogError, CatalogStore, MemoryCatalog, UpsertOutcome};
pub use sync::{MemorySyncRuns, SyncRun, SyncRunStore};
