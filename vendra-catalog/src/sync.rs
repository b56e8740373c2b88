use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::store::CatalogError;

/// Per (tenant, provider) bookkeeping: when the category tree and the
/// inventory were last successfully synced. Lets the reconciler run
/// incrementally instead of rescanning the whole catalog every invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRun {
    pub tenant_id: String,
    pub provider: String,
    pub last_category_sync: Option<DateTime<Utc>>,
    pub last_inventory_sync: Option<DateTime<Utc>>,
}

impl SyncRun {
    pub fn new(tenant_id: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            provider: provider.into(),
            last_category_sync: None,
            last_inventory_sync: None,
        }
    }
}

#[async_trait]
pub trait SyncRunStore: Send + Sync {
    async fn get(&self, tenant: &str, provider: &str) -> Result<Option<SyncRun>, CatalogError>;

    async fn record_category_sync(
        &self,
        tenant: &str,
        provider: &str,
        at: DateTime<Utc>,
    ) -> Result<(), CatalogError>;

    async fn record_inventory_sync(
        &self,
        tenant: &str,
        provider: &str,
        at: DateTime<Utc>,
    ) -> Result<(), CatalogError>;
}

#[derive(Default)]
pub struct MemorySyncRuns {
    runs: RwLock<HashMap<(String, String), SyncRun>>,
}

impl MemorySyncRuns {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SyncRunStore for MemorySyncRuns {
    async fn get(&self, tenant: &str, provider: &str) -> Result<Option<SyncRun>, CatalogError> {
        let runs = self.runs.read().await;
        Ok(runs
            .get(&(tenant.to_string(), provider.to_string()))
            .cloned())
    }

    async fn record_category_sync(
        &self,
        tenant: &str,
        provider: &str,
        at: DateTime<Utc>,
    ) -> Result<(), CatalogError> {
        let mut runs = self.runs.write().await;
        runs.entry((tenant.to_string(), provider.to_string()))
            .or_insert_with(|| SyncRun::new(tenant, provider))
            .last_category_sync = Some(at);
        Ok(())
    }

    async fn record_inventory_sync(
        &self,
        tenant: &str,
        provider: &str,
        at: DateTime<Utc>,
    ) -> Result<(), CatalogError> {
        let mut runs = self.runs.write().await;
        runs.entry((tenant.to_string(), provider.to_string()))
            .or_insert_with(|| SyncRun::new(tenant, provider))
            .last_inventory_sync = Some(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_are_keyed_per_tenant_and_provider() {
        let store = MemorySyncRuns::new();
        let now = Utc::now();

        store
            .record_category_sync("t1", "alibaba", now)
            .await
            .unwrap();

        let run = store.get("t1", "alibaba").await.unwrap().unwrap();
        assert_eq!(run.last_category_sync, Some(now));
        assert!(run.last_inventory_sync.is_none());

        assert!(store.get("t2", "alibaba").await.unwrap().is_none());
    }
}
