use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::proposal::ProposalId;
use crate::domain::tender::TenderId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApprovalId(pub String);

/// Workflow stage an approval represents. Closed set: adding a stage is a
/// source change, never a data migration of free-form strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalScope {
    AperturaTender,
    ComiteRfp,
    ComiteEjecutivo,
    GerenteTi,
    DirectorTi,
    VpTi,
}

impl ApprovalScope {
    pub const ALL: [ApprovalScope; 6] = [
        Self::AperturaTender,
        Self::ComiteRfp,
        Self::ComiteEjecutivo,
        Self::GerenteTi,
        Self::DirectorTi,
        Self::VpTi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AperturaTender => "apertura_tender",
            Self::ComiteRfp => "comite_rfp",
            Self::ComiteEjecutivo => "comite_ejecutivo",
            Self::GerenteTi => "gerente_ti",
            Self::DirectorTi => "director_ti",
            Self::VpTi => "vp_ti",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|scope| scope.as_str() == value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Pending,
    Approved,
    Rejected,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// The entity an approval signs off on. Exactly one target exists per
/// approval; the variant carries that invariant instead of two nullable ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalTarget {
    Proposal(ProposalId),
    Tender(TenderId),
}

impl ApprovalTarget {
    pub fn proposal_id(&self) -> Option<&ProposalId> {
        match self {
            Self::Proposal(id) => Some(id),
            Self::Tender(_) => None,
        }
    }

    pub fn tender_id(&self) -> Option<&TenderId> {
        match self {
            Self::Proposal(_) => None,
            Self::Tender(id) => Some(id),
        }
    }

    /// Stable identifier string for audit payloads and logs.
    pub fn id_str(&self) -> &str {
        match self {
            Self::Proposal(id) => &id.0,
            Self::Tender(id) => &id.0,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Proposal(_) => "proposal",
            Self::Tender(_) => "tender",
        }
    }
}

/// One sign-off request for a (target, scope) pair.
///
/// Created pending by an admin, decided exactly once by whoever holds the
/// bearer token, never deleted. `decided_by` is fixed to `approver_email` at
/// decision time: decisions are token-authenticated, so there is no session
/// identity to record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub id: ApprovalId,
    pub scope: ApprovalScope,
    pub target: ApprovalTarget,
    pub approver_email: String,
    pub decision: Decision,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<String>,
    pub comment: Option<String>,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Approval {
    /// A token is decidable up to and including `expires_at`; it expires
    /// only once `now` has passed that instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::{ApprovalScope, Decision};

    #[test]
    fn scope_round_trips_through_wire_strings() {
        for scope in ApprovalScope::ALL {
            assert_eq!(ApprovalScope::parse(scope.as_str()), Some(scope));
        }
        assert_eq!(ApprovalScope::parse("comite_rfp"), Some(ApprovalScope::ComiteRfp));
        assert_eq!(ApprovalScope::parse("legal_review"), None);
        assert_eq!(ApprovalScope::parse("COMITE_RFP"), None);
    }

    #[test]
    fn decision_parse_rejects_unknown_values() {
        assert_eq!(Decision::parse("approved"), Some(Decision::Approved));
        assert_eq!(Decision::parse("escalated"), None);
    }

    #[test]
    fn token_is_decidable_through_its_last_instant() {
        use chrono::{Duration, Utc};

        use super::{Approval, ApprovalId, ApprovalTarget};
        use crate::domain::proposal::ProposalId;

        let now = Utc::now();
        let approval = Approval {
            id: ApprovalId("apr-1".into()),
            scope: ApprovalScope::ComiteRfp,
            target: ApprovalTarget::Proposal(ProposalId("prop-1".into())),
            approver_email: "a@x.com".into(),
            decision: Decision::Pending,
            decided_at: None,
            decided_by: None,
            comment: None,
            token: "ab".repeat(32),
            expires_at: now,
            created_at: now - Duration::days(7),
        };

        assert!(!approval.is_expired(now));
        assert!(approval.is_expired(now + Duration::seconds(1)));
        assert!(!approval.is_expired(now - Duration::seconds(1)));
    }

    #[test]
    fn pending_is_the_only_non_terminal_decision() {
        assert!(!Decision::Pending.is_terminal());
        assert!(Decision::Approved.is_terminal());
        assert!(Decision::Rejected.is_terminal());
    }
}
