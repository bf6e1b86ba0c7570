//! Approval workflow routes.
//!
//! Endpoints:
//! - `POST /api/v1/approvals`        — create a pending approval (admin only)
//! - `POST /api/v1/approvals/decide` — decide by bearer token (no session)
//! - `GET  /api/v1/approvals`        — role-scoped listing with filters
//!
//! Tokens are bearer credentials: the full token leaves the system exactly
//! once, in the create response. Logs and audit payloads carry only the
//! 8-char prefix.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use procura_core::audit::AuditEvent;
use procura_core::auth::AuthContext;
use procura_core::config::ApprovalsConfig;
use procura_core::domain::approval::{
    Approval, ApprovalId, ApprovalScope, ApprovalTarget, Decision,
};
use procura_core::errors::WorkflowError;
use procura_core::token::{self, token_prefix};
use procura_core::workflow::{
    validate_create, validate_decide, CreateApprovalInput, DecideInput,
};
use procura_db::repositories::{
    ApprovalListFilter, ApprovalListItem, ApprovalRepository, AuditRepository, DecideOutcome,
    ProposalRepository, SqlApprovalRepository, SqlAuditRepository, SqlProposalRepository,
    SqlTenderRepository, TargetContext, TenderRepository,
};
use procura_db::DbPool;

use crate::auth::Identity;
use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub approvals: ApprovalsConfig,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/approvals", post(create_approval).get(list_approvals))
        .route("/api/v1/approvals/decide", post(decide_approval))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ApprovalBody {
    pub id: String,
    pub scope: ApprovalScope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposal_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tender_id: Option<String>,
    pub approver_email: String,
    pub decision: Decision,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<String>,
    pub comment: Option<String>,
    /// Present only in the create response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub token_prefix: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ApprovalBody {
    fn from_approval(approval: Approval, include_token: bool) -> Self {
        Self {
            id: approval.id.0,
            scope: approval.scope,
            proposal_id: approval.target.proposal_id().map(|id| id.0.clone()),
            tender_id: approval.target.tender_id().map(|id| id.0.clone()),
            approver_email: approval.approver_email,
            decision: approval.decision,
            decided_at: approval.decided_at,
            decided_by: approval.decided_by,
            comment: approval.comment,
            token_prefix: token_prefix(&approval.token).to_string(),
            token: include_token.then_some(approval.token),
            expires_at: approval.expires_at,
            created_at: approval.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListItemBody {
    #[serde(flatten)]
    pub approval: ApprovalBody,
    pub target: Option<TargetContext>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub items: Vec<ListItemBody>,
    pub total: i64,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub proposal_id: Option<String>,
    pub tender_id: Option<String>,
    pub scope: Option<String>,
    pub decision: Option<String>,
    pub approver_email: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn create_approval(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Json(input): Json<CreateApprovalInput>,
) -> Result<(StatusCode, Json<ApprovalBody>), ApiError> {
    if !caller.is_admin() {
        return Err(WorkflowError::Forbidden.into());
    }

    let validated = validate_create(&input)?;
    ensure_target_exists(&state.db_pool, &validated.target).await?;

    let issued = token::issue(state.approvals.token_ttl_days);
    let approval = Approval {
        id: ApprovalId(Uuid::new_v4().simple().to_string()),
        scope: validated.scope,
        target: validated.target,
        approver_email: validated.approver_email,
        decision: Decision::Pending,
        decided_at: None,
        decided_by: None,
        comment: validated.comment,
        token: issued.token,
        expires_at: issued.expires_at,
        created_at: Utc::now(),
    };

    SqlApprovalRepository::new(state.db_pool.clone()).insert(&approval).await?;

    info!(
        event_name = "approvals.created",
        approval_id = %approval.id.0,
        scope = approval.scope.as_str(),
        target_kind = approval.target.kind(),
        target_id = approval.target.id_str(),
        token_prefix = token_prefix(&approval.token),
        "approval created"
    );

    record_audit(
        &state.db_pool,
        AuditEvent::new(
            "approval",
            approval.id.0.clone(),
            "created",
            json!({
                "scope": approval.scope.as_str(),
                "target_kind": approval.target.kind(),
                "target_id": approval.target.id_str(),
                "approver_email": approval.approver_email,
                "token_prefix": token_prefix(&approval.token),
                "expires_at": approval.expires_at.to_rfc3339(),
            }),
        )
        .with_actor(caller.user_id),
    )
    .await;

    Ok((StatusCode::CREATED, Json(ApprovalBody::from_approval(approval, true))))
}

pub async fn decide_approval(
    State(state): State<AppState>,
    Json(input): Json<DecideInput>,
) -> Result<Json<ApprovalBody>, ApiError> {
    let validated = validate_decide(&input)?;

    let repository = SqlApprovalRepository::new(state.db_pool.clone());
    let outcome = repository
        .decide_by_token(
            &validated.token,
            validated.decision,
            validated.comment.as_deref(),
            Utc::now(),
        )
        .await?;

    let approval = match outcome {
        DecideOutcome::Decided(approval) => approval,
        // unknown, malformed and already-decided tokens are indistinguishable
        DecideOutcome::NotFound => {
            return Err(
                WorkflowError::NotFound("invalid or already-processed token".into()).into()
            );
        }
        DecideOutcome::Expired => return Err(WorkflowError::Gone.into()),
    };

    info!(
        event_name = "approvals.decided",
        approval_id = %approval.id.0,
        decision = approval.decision.as_str(),
        token_prefix = token_prefix(&approval.token),
        "approval decided"
    );

    let action = match approval.decision {
        Decision::Approved => "approved",
        _ => "rejected",
    };
    record_audit(
        &state.db_pool,
        AuditEvent::new(
            "approval",
            approval.id.0.clone(),
            action,
            json!({
                "scope": approval.scope.as_str(),
                "target_kind": approval.target.kind(),
                "target_id": approval.target.id_str(),
                "approver_email": approval.approver_email,
                "decision": approval.decision.as_str(),
                "comment": approval.comment,
                "decided_at": approval.decided_at.map(|dt| dt.to_rfc3339()),
                "token_prefix": token_prefix(&approval.token),
            }),
        )
        .with_actor(approval.approver_email.clone()),
    )
    .await;

    Ok(Json(ApprovalBody::from_approval(approval, false)))
}

pub async fn list_approvals(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let filter = build_filter(&query, &caller, &state.approvals)?;

    let (items, total) = SqlApprovalRepository::new(state.db_pool.clone()).list(&filter).await?;

    let items = items
        .into_iter()
        .map(|ApprovalListItem { approval, context }| ListItemBody {
            approval: ApprovalBody::from_approval(approval, false),
            target: context,
        })
        .collect();

    Ok(Json(ListResponse { items, total, limit: filter.limit, offset: filter.offset }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn ensure_target_exists(pool: &DbPool, target: &ApprovalTarget) -> Result<(), ApiError> {
    match target {
        ApprovalTarget::Proposal(id) => {
            SqlProposalRepository::new(pool.clone())
                .find_by_id(id)
                .await?
                .map(|_| ())
                .ok_or_else(|| {
                    ApiError(WorkflowError::NotFound(format!("proposal `{}` not found", id.0)))
                })
        }
        ApprovalTarget::Tender(id) => SqlTenderRepository::new(pool.clone())
            .find_by_id(id)
            .await?
            .map(|_| ())
            .ok_or_else(|| {
                ApiError(WorkflowError::NotFound(format!("tender `{}` not found", id.0)))
            }),
    }
}

/// Translates query parameters into a repository filter, enforcing the
/// role scoping rule: non-admins only ever see their own approvals.
fn build_filter(
    query: &ListQuery,
    caller: &AuthContext,
    config: &ApprovalsConfig,
) -> Result<ApprovalListFilter, ApiError> {
    let mut violations = Vec::new();

    let scope = match &query.scope {
        Some(raw) => {
            let parsed = ApprovalScope::parse(raw.trim());
            if parsed.is_none() {
                violations.push("scope".to_string());
            }
            parsed
        }
        None => None,
    };
    let decision = match &query.decision {
        Some(raw) => {
            let parsed = Decision::parse(raw.trim());
            if parsed.is_none() {
                violations.push("decision".to_string());
            }
            parsed
        }
        None => None,
    };

    if !violations.is_empty() {
        return Err(WorkflowError::InvalidInput { fields: violations }.into());
    }

    let approver_email = if caller.is_admin() {
        query.approver_email.clone()
    } else {
        // forced, regardless of what the query asked for
        Some(caller.email.clone())
    };

    let limit = query
        .limit
        .unwrap_or(config.default_page_size)
        .clamp(1, config.max_page_size);

    Ok(ApprovalListFilter {
        proposal_id: query.proposal_id.clone(),
        tender_id: query.tender_id.clone(),
        scope,
        decision,
        approver_email,
        limit,
        offset: query.offset.unwrap_or(0),
    })
}

/// Best-effort by contract: an audit failure is logged and swallowed,
/// never surfaced to the business operation.
async fn record_audit(pool: &DbPool, event: AuditEvent) {
    if let Err(error) = SqlAuditRepository::new(pool.clone()).append(&event).await {
        warn!(
            event_name = "approvals.audit_write_failed",
            entity_id = %event.entity_id,
            action = %event.action,
            error = %error,
            "audit event dropped"
        );
    }
}
