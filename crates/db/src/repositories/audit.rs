use chrono::{DateTime, Utc};
use sqlx::Row;

use procura_core::audit::AuditEvent;

use super::{AuditRepository, RepositoryError};
use crate::DbPool;

pub struct SqlAuditRepository {
    pool: DbPool,
}

impl SqlAuditRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode(field: &str, error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(format!("audit_event.{field}: {error}"))
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<AuditEvent, RepositoryError> {
    let payload_json: String = row.try_get("payload_json").map_err(|e| decode("payload_json", e))?;
    let occurred_at_str: String =
        row.try_get("occurred_at").map_err(|e| decode("occurred_at", e))?;

    Ok(AuditEvent {
        id: row.try_get("id").map_err(|e| decode("id", e))?,
        entity_type: row.try_get("entity_type").map_err(|e| decode("entity_type", e))?,
        entity_id: row.try_get("entity_id").map_err(|e| decode("entity_id", e))?,
        action: row.try_get("action").map_err(|e| decode("action", e))?,
        actor: row.try_get("actor").map_err(|e| decode("actor", e))?,
        payload: serde_json::from_str(&payload_json).map_err(|e| decode("payload_json", e))?,
        occurred_at: DateTime::parse_from_rfc3339(&occurred_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| decode("occurred_at", e))?,
    })
}

#[async_trait::async_trait]
impl AuditRepository for SqlAuditRepository {
    async fn append(&self, event: &AuditEvent) -> Result<(), RepositoryError> {
        let payload_json = serde_json::to_string(&event.payload)
            .map_err(|e| decode("payload_json", e))?;

        sqlx::query(
            "INSERT INTO audit_event (id, entity_type, entity_id, action, actor, payload_json, occurred_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&event.id)
        .bind(&event.entity_type)
        .bind(&event.entity_id)
        .bind(&event.action)
        .bind(&event.actor)
        .bind(payload_json)
        .bind(event.occurred_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from_write)?;

        Ok(())
    }

    async fn list_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<AuditEvent>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, entity_type, entity_id, action, actor, payload_json, occurred_at
             FROM audit_event
             WHERE entity_type = ? AND entity_id = ?
             ORDER BY occurred_at ASC",
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_event).collect()
    }
}
