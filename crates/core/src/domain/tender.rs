use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenderId(pub String);

/// Tender (procurement call) referenced by the approval workflow. Read-only
/// from this service's perspective.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tender {
    pub id: TenderId,
    pub code: String,
    pub title: String,
    pub status: String,
    pub budget: Decimal,
    pub deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
