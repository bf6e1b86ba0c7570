use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use procura_core::audit::AuditEvent;
use procura_core::domain::approval::{Approval, ApprovalId, Decision};
use procura_core::domain::proposal::{Proposal, ProposalId};
use procura_core::domain::tender::{Tender, TenderId};

pub mod approval;
pub mod audit;
pub mod proposal;
pub mod tender;

pub use approval::{
    ApprovalListFilter, ApprovalListItem, DecideOutcome, SqlApprovalRepository, TargetContext,
};
pub use audit::SqlAuditRepository;
pub use proposal::SqlProposalRepository;
pub use tender::SqlTenderRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("row violates a uniqueness constraint")]
    Conflict,
}

impl RepositoryError {
    /// Lift SQLite unique-constraint violations into `Conflict` so callers
    /// see a deterministic duplicate error instead of a bare database error.
    pub(crate) fn from_write(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(db_error) if db_error.is_unique_violation() => Self::Conflict,
            _ => Self::Database(error),
        }
    }
}

#[async_trait]
pub trait ApprovalRepository: Send + Sync {
    async fn insert(&self, approval: &Approval) -> Result<(), RepositoryError>;

    /// Atomic conditional decision: updates only a pending, unexpired row
    /// matching `token`. The single UPDATE is what guarantees at-most-once
    /// decisions under concurrent submissions.
    async fn decide_by_token(
        &self,
        token: &str,
        decision: Decision,
        comment: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<DecideOutcome, RepositoryError>;

    async fn find_by_id(&self, id: &ApprovalId) -> Result<Option<Approval>, RepositoryError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<Approval>, RepositoryError>;

    /// Filtered page plus total count of the filtered set.
    async fn list(
        &self,
        filter: &ApprovalListFilter,
    ) -> Result<(Vec<ApprovalListItem>, i64), RepositoryError>;
}

#[async_trait]
pub trait ProposalRepository: Send + Sync {
    async fn find_by_id(&self, id: &ProposalId) -> Result<Option<Proposal>, RepositoryError>;
    async fn save(&self, proposal: &Proposal) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait TenderRepository: Send + Sync {
    async fn find_by_id(&self, id: &TenderId) -> Result<Option<Tender>, RepositoryError>;
    async fn save(&self, tender: &Tender) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn append(&self, event: &AuditEvent) -> Result<(), RepositoryError>;
    async fn list_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<AuditEvent>, RepositoryError>;
}
