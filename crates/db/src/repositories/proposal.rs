use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use procura_core::domain::proposal::{Proposal, ProposalId};
use procura_core::domain::tender::TenderId;

use super::{ProposalRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProposalRepository {
    pool: DbPool,
}

impl SqlProposalRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode(field: &str, error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(format!("proposal.{field}: {error}"))
}

fn row_to_proposal(row: &sqlx::sqlite::SqliteRow) -> Result<Proposal, RepositoryError> {
    let amount_str: String = row.try_get("amount").map_err(|e| decode("amount", e))?;
    let delivery_months: i64 =
        row.try_get("delivery_months").map_err(|e| decode("delivery_months", e))?;
    let created_at_str: String = row.try_get("created_at").map_err(|e| decode("created_at", e))?;

    Ok(Proposal {
        id: ProposalId(row.try_get("id").map_err(|e| decode("id", e))?),
        tender_id: TenderId(row.try_get("tender_id").map_err(|e| decode("tender_id", e))?),
        supplier_id: row.try_get("supplier_id").map_err(|e| decode("supplier_id", e))?,
        amount: Decimal::from_str(&amount_str).map_err(|e| decode("amount", e))?,
        delivery_months: u32::try_from(delivery_months).map_err(|e| decode("delivery_months", e))?,
        status: row.try_get("status").map_err(|e| decode("status", e))?,
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| decode("created_at", e))?,
    })
}

#[async_trait::async_trait]
impl ProposalRepository for SqlProposalRepository {
    async fn find_by_id(&self, id: &ProposalId) -> Result<Option<Proposal>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, tender_id, supplier_id, amount, delivery_months, status, created_at
             FROM proposal WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_proposal(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, proposal: &Proposal) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO proposal (id, tender_id, supplier_id, amount, delivery_months, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 tender_id = excluded.tender_id,
                 supplier_id = excluded.supplier_id,
                 amount = excluded.amount,
                 delivery_months = excluded.delivery_months,
                 status = excluded.status",
        )
        .bind(&proposal.id.0)
        .bind(&proposal.tender_id.0)
        .bind(&proposal.supplier_id)
        .bind(proposal.amount.to_string())
        .bind(i64::from(proposal.delivery_months))
        .bind(&proposal.status)
        .bind(proposal.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from_write)?;

        Ok(())
    }
}
