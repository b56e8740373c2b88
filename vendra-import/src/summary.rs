use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One category that could not be imported. The run keeps going; these are
/// collected instead of aborting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryFailure {
    pub slug: String,
    pub error: String,
}

/// What a sync run did. Always returned: a run completes with a summary
/// rather than throwing, except for pre-flight configuration errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
    pub tenant_id: String,
    pub provider: String,
    /// True when the fallback taxonomy was used instead of provider data.
    pub used_fallback: bool,
    pub categories_synced: u64,
    pub products_imported: u64,
    pub products_updated: u64,
    pub products_skipped: u64,
    pub failed_categories: Vec<CategoryFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ImportSummary {
    pub fn new(tenant_id: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            provider: provider.into(),
            used_fallback: false,
            categories_synced: 0,
            products_imported: 0,
            products_updated: 0,
            products_skipped: 0,
            failed_categories: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedProduct {
    pub product_id: Uuid,
    pub external_id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub tenant_id: String,
    pub provider: String,
    pub refreshed: u64,
    /// Inside the freshness window of an incremental run; not re-fetched.
    pub already_fresh: u64,
    /// Products whose provider lookup failed: reported, never deleted or
    /// zeroed. Stale-but-present beats destructive failure.
    pub skipped: Vec<SkippedProduct>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ReconcileSummary {
    pub fn new(tenant_id: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            provider: provider.into(),
            refreshed: 0,
            already_fresh: 0,
            skipped: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }
}
