pub mod cancel;
pub mod importer;
pub mod reconciler;
pub mod summary;

#[cfg(test)]
mod testutil;

pub use cancel::CancelToken;
pub use importer::{CatalogImporter, ImportConfig, ImportError, SyncOptions};
pub use reconciler::{InventoryReconciler, ReconcileOptions};
pub use summary::{CategoryFailure, ImportSummary, ReconcileSummary, SkippedProduct};
