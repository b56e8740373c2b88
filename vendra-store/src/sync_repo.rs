use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use vendra_catalog::{CatalogError, SyncRun, SyncRunStore};

pub struct PgSyncRuns {
    pool: PgPool,
}

impl PgSyncRuns {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage(err: sqlx::Error) -> CatalogError {
    CatalogError::Storage(err.to_string())
}

#[async_trait]
impl SyncRunStore for PgSyncRuns {
    async fn get(&self, tenant: &str, provider: &str) -> Result<Option<SyncRun>, CatalogError> {
        let row: Option<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> = sqlx::query_as(
            r#"
            SELECT last_category_sync, last_inventory_sync
            FROM sync_runs
            WHERE tenant_id = $1 AND provider = $2
            "#,
        )
        .bind(tenant)
        .bind(provider)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        Ok(row.map(|(category, inventory)| SyncRun {
            tenant_id: tenant.to_string(),
            provider: provider.to_string(),
            last_category_sync: category,
            last_inventory_sync: inventory,
        }))
    }

    async fn record_category_sync(
        &self,
        tenant: &str,
        provider: &str,
        at: DateTime<Utc>,
    ) -> Result<(), CatalogError> {
        sqlx::query(
            r#"
            INSERT INTO sync_runs (tenant_id, provider, last_category_sync)
            VALUES ($1, $2, $3)
            ON CONFLICT (tenant_id, provider) DO UPDATE
            SET last_category_sync = EXCLUDED.last_category_sync
            "#,
        )
        .bind(tenant)
        .bind(provider)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn record_inventory_sync(
        &self,
        tenant: &str,
        provider: &str,
        at: DateTime<Utc>,
    ) -> Result<(), CatalogError> {
        sqlx::query(
            r#"
            INSERT INTO sync_runs (tenant_id, provider, last_inventory_sync)
            VALUES ($1, $2, $3)
            ON CONFLICT (tenant_id, provider) DO UPDATE
            SET last_inventory_sync = EXCLUDED.last_inventory_sync
            "#,
        )
        .bind(tenant)
        .bind(provider)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }
}
