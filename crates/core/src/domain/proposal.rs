use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::tender::TenderId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProposalId(pub String);

/// Supplier proposal referenced by the approval workflow. Owned elsewhere;
/// the workflow only reads it for the creation-time existence check and for
/// listing context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub tender_id: TenderId,
    pub supplier_id: String,
    pub amount: Decimal,
    pub delivery_months: u32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
