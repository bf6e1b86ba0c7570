use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use procura_core::domain::tender::{Tender, TenderId};

use super::{RepositoryError, TenderRepository};
use crate::DbPool;

pub struct SqlTenderRepository {
    pool: DbPool,
}

impl SqlTenderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode(field: &str, error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(format!("tender.{field}: {error}"))
}

fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| decode(field, e))
}

fn row_to_tender(row: &sqlx::sqlite::SqliteRow) -> Result<Tender, RepositoryError> {
    let budget_str: String = row.try_get("budget").map_err(|e| decode("budget", e))?;
    let deadline_str: String = row.try_get("deadline").map_err(|e| decode("deadline", e))?;
    let created_at_str: String = row.try_get("created_at").map_err(|e| decode("created_at", e))?;

    Ok(Tender {
        id: TenderId(row.try_get("id").map_err(|e| decode("id", e))?),
        code: row.try_get("code").map_err(|e| decode("code", e))?,
        title: row.try_get("title").map_err(|e| decode("title", e))?,
        status: row.try_get("status").map_err(|e| decode("status", e))?,
        budget: Decimal::from_str(&budget_str).map_err(|e| decode("budget", e))?,
        deadline: parse_timestamp("deadline", &deadline_str)?,
        created_at: parse_timestamp("created_at", &created_at_str)?,
    })
}

#[async_trait::async_trait]
impl TenderRepository for SqlTenderRepository {
    async fn find_by_id(&self, id: &TenderId) -> Result<Option<Tender>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, code, title, status, budget, deadline, created_at
             FROM tender WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_tender(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, tender: &Tender) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO tender (id, code, title, status, budget, deadline, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 code = excluded.code,
                 title = excluded.title,
                 status = excluded.status,
                 budget = excluded.budget,
                 deadline = excluded.deadline",
        )
        .bind(&tender.id.0)
        .bind(&tender.code)
        .bind(&tender.title)
        .bind(&tender.status)
        .bind(tender.budget.to_string())
        .bind(tender.deadline.to_rfc3339())
        .bind(tender.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from_write)?;

        Ok(())
    }
}
