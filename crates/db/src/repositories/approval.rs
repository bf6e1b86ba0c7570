use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{QueryBuilder, Row};

use procura_core::domain::approval::{
    Approval, ApprovalId, ApprovalScope, ApprovalTarget, Decision,
};
use procura_core::domain::proposal::ProposalId;
use procura_core::domain::tender::TenderId;

use super::{ApprovalRepository, RepositoryError};
use crate::DbPool;

pub struct SqlApprovalRepository {
    pool: DbPool,
}

impl SqlApprovalRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Outcome of the conditional decision update. `NotFound` deliberately covers
/// unknown, malformed, and already-decided tokens alike.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecideOutcome {
    Decided(Approval),
    NotFound,
    Expired,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApprovalListFilter {
    pub proposal_id: Option<String>,
    pub tender_id: Option<String>,
    pub scope: Option<ApprovalScope>,
    pub decision: Option<Decision>,
    pub approver_email: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

/// Minimal display context for the approval's target, joined at list time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetContext {
    Proposal {
        tender_id: String,
        supplier_id: String,
        amount: Decimal,
        delivery_months: u32,
        status: String,
    },
    Tender {
        code: String,
        title: String,
        status: String,
        budget: Decimal,
        deadline: DateTime<Utc>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApprovalListItem {
    pub approval: Approval,
    pub context: Option<TargetContext>,
}

const APPROVAL_COLUMNS: &str = "id, scope, proposal_id, tender_id, approver_email, decision,
        decided_at, decided_by, comment, token, expires_at, created_at";

fn decode(field: &str, error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(format!("approval.{field}: {error}"))
}

fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| decode(field, e))
}

fn row_to_approval(row: &sqlx::sqlite::SqliteRow) -> Result<Approval, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| decode("id", e))?;
    let scope_str: String = row.try_get("scope").map_err(|e| decode("scope", e))?;
    let proposal_id: Option<String> =
        row.try_get("proposal_id").map_err(|e| decode("proposal_id", e))?;
    let tender_id: Option<String> = row.try_get("tender_id").map_err(|e| decode("tender_id", e))?;
    let approver_email: String =
        row.try_get("approver_email").map_err(|e| decode("approver_email", e))?;
    let decision_str: String = row.try_get("decision").map_err(|e| decode("decision", e))?;
    let decided_at_str: Option<String> =
        row.try_get("decided_at").map_err(|e| decode("decided_at", e))?;
    let decided_by: Option<String> =
        row.try_get("decided_by").map_err(|e| decode("decided_by", e))?;
    let comment: Option<String> = row.try_get("comment").map_err(|e| decode("comment", e))?;
    let token: String = row.try_get("token").map_err(|e| decode("token", e))?;
    let expires_at_str: String = row.try_get("expires_at").map_err(|e| decode("expires_at", e))?;
    let created_at_str: String = row.try_get("created_at").map_err(|e| decode("created_at", e))?;

    let scope = ApprovalScope::parse(&scope_str)
        .ok_or_else(|| decode("scope", format!("unknown scope `{scope_str}`")))?;
    let decision = Decision::parse(&decision_str)
        .ok_or_else(|| decode("decision", format!("unknown decision `{decision_str}`")))?;

    let target = match (proposal_id, tender_id) {
        (Some(id), None) => ApprovalTarget::Proposal(ProposalId(id)),
        (None, Some(id)) => ApprovalTarget::Tender(TenderId(id)),
        _ => return Err(decode("target", "row does not have exactly one target")),
    };

    let decided_at = match decided_at_str {
        Some(raw) => Some(parse_timestamp("decided_at", &raw)?),
        None => None,
    };

    Ok(Approval {
        id: ApprovalId(id),
        scope,
        target,
        approver_email,
        decision,
        decided_at,
        decided_by,
        comment,
        token,
        expires_at: parse_timestamp("expires_at", &expires_at_str)?,
        created_at: parse_timestamp("created_at", &created_at_str)?,
    })
}

fn row_to_context(row: &sqlx::sqlite::SqliteRow) -> Result<Option<TargetContext>, RepositoryError> {
    let proposal_tender_id: Option<String> =
        row.try_get("p_tender_id").map_err(|e| decode("p_tender_id", e))?;
    if let Some(tender_id) = proposal_tender_id {
        let amount_str: String = row.try_get("p_amount").map_err(|e| decode("p_amount", e))?;
        let delivery_months: i64 =
            row.try_get("p_delivery_months").map_err(|e| decode("p_delivery_months", e))?;
        return Ok(Some(TargetContext::Proposal {
            tender_id,
            supplier_id: row.try_get("p_supplier_id").map_err(|e| decode("p_supplier_id", e))?,
            amount: Decimal::from_str(&amount_str).map_err(|e| decode("p_amount", e))?,
            delivery_months: u32::try_from(delivery_months)
                .map_err(|e| decode("p_delivery_months", e))?,
            status: row.try_get("p_status").map_err(|e| decode("p_status", e))?,
        }));
    }

    let tender_code: Option<String> = row.try_get("t_code").map_err(|e| decode("t_code", e))?;
    if let Some(code) = tender_code {
        let budget_str: String = row.try_get("t_budget").map_err(|e| decode("t_budget", e))?;
        let deadline_str: String = row.try_get("t_deadline").map_err(|e| decode("t_deadline", e))?;
        return Ok(Some(TargetContext::Tender {
            code,
            title: row.try_get("t_title").map_err(|e| decode("t_title", e))?,
            status: row.try_get("t_status").map_err(|e| decode("t_status", e))?,
            budget: Decimal::from_str(&budget_str).map_err(|e| decode("t_budget", e))?,
            deadline: parse_timestamp("t_deadline", &deadline_str)?,
        }));
    }

    // Target row no longer resolvable; the approval itself is still listed.
    Ok(None)
}

fn push_filters(builder: &mut QueryBuilder<'_, sqlx::Sqlite>, filter: &ApprovalListFilter) {
    if let Some(proposal_id) = &filter.proposal_id {
        builder.push(" AND a.proposal_id = ");
        builder.push_bind(proposal_id.clone());
    }
    if let Some(tender_id) = &filter.tender_id {
        builder.push(" AND a.tender_id = ");
        builder.push_bind(tender_id.clone());
    }
    if let Some(scope) = filter.scope {
        builder.push(" AND a.scope = ");
        builder.push_bind(scope.as_str());
    }
    if let Some(decision) = filter.decision {
        builder.push(" AND a.decision = ");
        builder.push_bind(decision.as_str());
    }
    if let Some(approver_email) = &filter.approver_email {
        builder.push(" AND a.approver_email = ");
        builder.push_bind(approver_email.clone());
    }
}

#[async_trait::async_trait]
impl ApprovalRepository for SqlApprovalRepository {
    async fn insert(&self, approval: &Approval) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO approval (id, scope, proposal_id, tender_id, approver_email, decision,
                                   decided_at, decided_by, comment, token, expires_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&approval.id.0)
        .bind(approval.scope.as_str())
        .bind(approval.target.proposal_id().map(|id| id.0.as_str()))
        .bind(approval.target.tender_id().map(|id| id.0.as_str()))
        .bind(&approval.approver_email)
        .bind(approval.decision.as_str())
        .bind(approval.decided_at.map(|dt| dt.to_rfc3339()))
        .bind(&approval.decided_by)
        .bind(&approval.comment)
        .bind(&approval.token)
        .bind(approval.expires_at.to_rfc3339())
        .bind(approval.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from_write)?;

        Ok(())
    }

    async fn decide_by_token(
        &self,
        token: &str,
        decision: Decision,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<DecideOutcome, RepositoryError> {
        let now_str = now.to_rfc3339();

        // Single conditional write; the pending + expiry guards in the WHERE
        // clause are what make a double decision impossible.
        let result = sqlx::query(
            "UPDATE approval
             SET decision = ?, decided_at = ?, decided_by = approver_email,
                 comment = COALESCE(?, comment)
             WHERE token = ? AND decision = 'pending' AND expires_at >= ?",
        )
        .bind(decision.as_str())
        .bind(&now_str)
        .bind(comment)
        .bind(token)
        .bind(&now_str)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            let decided = self
                .find_by_token(token)
                .await?
                .ok_or_else(|| RepositoryError::Decode("decided row vanished".to_string()))?;
            return Ok(DecideOutcome::Decided(decided));
        }

        // Zero rows: distinguish "once valid but expired" from everything else.
        match self.find_by_token(token).await? {
            Some(existing)
                if existing.decision == Decision::Pending && existing.is_expired(now) =>
            {
                Ok(DecideOutcome::Expired)
            }
            _ => Ok(DecideOutcome::NotFound),
        }
    }

    async fn find_by_id(&self, id: &ApprovalId) -> Result<Option<Approval>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {APPROVAL_COLUMNS} FROM approval WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_approval(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Approval>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {APPROVAL_COLUMNS} FROM approval WHERE token = ?"))
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_approval(r)?)),
            None => Ok(None),
        }
    }

    async fn list(
        &self,
        filter: &ApprovalListFilter,
    ) -> Result<(Vec<ApprovalListItem>, i64), RepositoryError> {
        let mut count_builder =
            QueryBuilder::new("SELECT COUNT(*) AS total FROM approval a WHERE 1=1");
        push_filters(&mut count_builder, filter);
        let total: i64 = count_builder
            .build()
            .fetch_one(&self.pool)
            .await?
            .try_get("total")
            .map_err(|e| decode("total", e))?;

        let mut builder = QueryBuilder::new(
            "SELECT a.id, a.scope, a.proposal_id, a.tender_id, a.approver_email, a.decision,
                    a.decided_at, a.decided_by, a.comment, a.token, a.expires_at, a.created_at,
                    p.tender_id AS p_tender_id, p.supplier_id AS p_supplier_id,
                    p.amount AS p_amount, p.delivery_months AS p_delivery_months,
                    p.status AS p_status,
                    t.code AS t_code, t.title AS t_title, t.status AS t_status,
                    t.budget AS t_budget, t.deadline AS t_deadline
             FROM approval a
             LEFT JOIN proposal p ON p.id = a.proposal_id
             LEFT JOIN tender t ON t.id = a.tender_id
             WHERE 1=1",
        );
        push_filters(&mut builder, filter);
        // pending first, then newest created
        builder.push(
            " ORDER BY CASE WHEN a.decision = 'pending' THEN 0 ELSE 1 END, a.created_at DESC",
        );
        builder.push(" LIMIT ");
        builder.push_bind(i64::from(filter.limit));
        builder.push(" OFFSET ");
        builder.push_bind(i64::from(filter.offset));

        let rows = builder.build().fetch_all(&self.pool).await?;

        let items = rows
            .iter()
            .map(|row| {
                Ok(ApprovalListItem {
                    approval: row_to_approval(row)?,
                    context: row_to_context(row)?,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok((items, total))
    }
}
