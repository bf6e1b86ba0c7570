pub mod audit;
pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod token;
pub mod workflow;

pub use audit::AuditEvent;
pub use auth::{AuthContext, Role};
pub use domain::approval::{Approval, ApprovalId, ApprovalScope, ApprovalTarget, Decision};
pub use domain::proposal::{Proposal, ProposalId};
pub use domain::tender::{Tender, TenderId};
pub use errors::WorkflowError;
pub use token::{issue, token_prefix, IssuedToken};
pub use workflow::{
    CreateApprovalInput, DecideInput, ValidatedCreate, ValidatedDecision, TOKEN_TTL_DAYS,
};
