use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use vendra_order::{ExternalOrderMapping, MappingStatus, OrderError, OrderMappingStore};

pub struct PgOrderMappings {
    pool: PgPool,
}

impl PgOrderMappings {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage(err: sqlx::Error) -> OrderError {
    OrderError::Storage(err.to_string())
}

fn encode(mapping: &ExternalOrderMapping) -> Result<Value, OrderError> {
    serde_json::to_value(mapping).map_err(|e| OrderError::Storage(e.to_string()))
}

fn decode(doc: Value) -> Result<ExternalOrderMapping, OrderError> {
    serde_json::from_value(doc).map_err(|e| OrderError::Storage(e.to_string()))
}

fn status_str(status: MappingStatus) -> &'static str {
    match status {
        MappingStatus::Pending => "PENDING",
        MappingStatus::Submitted => "SUBMITTED",
        MappingStatus::Failed => "FAILED",
    }
}

#[async_trait]
impl OrderMappingStore for PgOrderMappings {
    async fn insert_mapping(&self, mapping: ExternalOrderMapping) -> Result<(), OrderError> {
        let doc = encode(&mapping)?;

        // A failed mapping may be replaced by a retry; anything else is a
        // duplicate.
        let result = sqlx::query(
            r#"
            INSERT INTO order_mappings (internal_order_id, provider, doc)
            VALUES ($1, $2, $3)
            ON CONFLICT (internal_order_id, provider) DO UPDATE
            SET doc = EXCLUDED.doc
            WHERE order_mappings.doc->>'status' = 'FAILED'
            "#,
        )
        .bind(mapping.internal_order_id)
        .bind(&mapping.provider)
        .bind(&doc)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        if result.rows_affected() == 0 {
            return Err(OrderError::Duplicate {
                order_id: mapping.internal_order_id,
                provider: mapping.provider,
            });
        }
        Ok(())
    }

    async fn get_mappings(
        &self,
        internal_order_id: Uuid,
    ) -> Result<Vec<ExternalOrderMapping>, OrderError> {
        let docs: Vec<Value> = sqlx::query_scalar(
            "SELECT doc FROM order_mappings WHERE internal_order_id = $1 ORDER BY provider",
        )
        .bind(internal_order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        docs.into_iter().map(decode).collect()
    }

    async fn find_by_external(
        &self,
        provider: &str,
        external_order_id: &str,
    ) -> Result<Option<ExternalOrderMapping>, OrderError> {
        let doc: Option<Value> = sqlx::query_scalar(
            r#"
            SELECT doc FROM order_mappings
            WHERE provider = $1 AND doc->>'external_order_id' = $2
            "#,
        )
        .bind(provider)
        .bind(external_order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        doc.map(decode).transpose()
    }

    async fn update_status(
        &self,
        provider: &str,
        external_order_id: &str,
        status: MappingStatus,
    ) -> Result<(), OrderError> {
        let current = self
            .find_by_external(provider, external_order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(format!("{}/{}", provider, external_order_id)))?;

        if !current.status.can_transition_to(status) {
            return Err(OrderError::InvalidTransition {
                from: format!("{:?}", current.status),
                to: format!("{:?}", status),
            });
        }

        // Optimistic: the previous status guards against a concurrent
        // transition racing this one.
        let result = sqlx::query(
            r#"
            UPDATE order_mappings
            SET doc = jsonb_set(
                jsonb_set(doc, '{status}', to_jsonb($3::TEXT)),
                '{updated_at}', to_jsonb($4::TEXT))
            WHERE provider = $1
              AND doc->>'external_order_id' = $2
              AND doc->>'status' = $5
            "#,
        )
        .bind(provider)
        .bind(external_order_id)
        .bind(status_str(status))
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(status_str(current.status))
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        if result.rows_affected() == 0 {
            return Err(OrderError::Storage(
                "mapping changed concurrently; retry the update".to_string(),
            ));
        }
        Ok(())
    }
}
