//! Shape validation for the approval lifecycle operations.
//!
//! Validation is the first step of every operation and produces typed values;
//! nothing downstream re-checks enum membership or email format. Field names
//! in violation lists match the wire field names.

use serde::Deserialize;

use crate::domain::approval::{ApprovalScope, ApprovalTarget, Decision};
use crate::domain::proposal::ProposalId;
use crate::domain::tender::TenderId;
use crate::errors::WorkflowError;

/// Default validity window for an issued approval token.
pub const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CreateApprovalInput {
    pub scope: String,
    pub proposal_id: Option<String>,
    pub tender_id: Option<String>,
    pub approver_email: String,
    pub comment: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedCreate {
    pub scope: ApprovalScope,
    pub target: ApprovalTarget,
    pub approver_email: String,
    pub comment: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DecideInput {
    pub token: String,
    pub decision: String,
    pub comment: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedDecision {
    pub token: String,
    pub decision: Decision,
    pub comment: Option<String>,
}

pub fn validate_create(input: &CreateApprovalInput) -> Result<ValidatedCreate, WorkflowError> {
    let mut violations = Vec::new();

    let scope = ApprovalScope::parse(input.scope.trim());
    if scope.is_none() {
        violations.push("scope".to_string());
    }

    let proposal_id = normalize_id(input.proposal_id.as_deref());
    let tender_id = normalize_id(input.tender_id.as_deref());
    let target = match (proposal_id, tender_id) {
        (Some(id), None) => Some(ApprovalTarget::Proposal(ProposalId(id))),
        (None, Some(id)) => Some(ApprovalTarget::Tender(TenderId(id))),
        // both or neither: the exactly-one-target invariant
        _ => {
            violations.push("proposal_id".to_string());
            violations.push("tender_id".to_string());
            None
        }
    };

    let approver_email = input.approver_email.trim();
    if !is_valid_email(approver_email) {
        violations.push("approver_email".to_string());
    }

    if !violations.is_empty() {
        return Err(WorkflowError::InvalidInput { fields: violations });
    }

    // violations is empty, so scope and target are both present
    Ok(ValidatedCreate {
        scope: scope.ok_or_else(|| WorkflowError::invalid(["scope"]))?,
        target: target.ok_or_else(|| WorkflowError::invalid(["proposal_id", "tender_id"]))?,
        approver_email: approver_email.to_string(),
        comment: normalize_comment(input.comment.as_deref()),
    })
}

pub fn validate_decide(input: &DecideInput) -> Result<ValidatedDecision, WorkflowError> {
    let mut violations = Vec::new();

    let token = input.token.trim();
    if token.is_empty() {
        violations.push("token".to_string());
    }

    // Only terminal decisions are submittable; `pending` is not a decision.
    let decision = match Decision::parse(input.decision.trim()) {
        Some(decision) if decision.is_terminal() => Some(decision),
        _ => {
            violations.push("decision".to_string());
            None
        }
    };

    if !violations.is_empty() {
        return Err(WorkflowError::InvalidInput { fields: violations });
    }

    Ok(ValidatedDecision {
        token: token.to_string(),
        decision: decision.ok_or_else(|| WorkflowError::invalid(["decision"]))?,
        comment: normalize_comment(input.comment.as_deref()),
    })
}

fn normalize_id(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn normalize_comment(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Deliberately permissive: one `@`, non-empty local part, dotted domain,
/// no whitespace. Deliverability is the mail system's problem.
fn is_valid_email(value: &str) -> bool {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let mut labels = domain.split('.');
    domain.contains('.') && labels.all(|label| !label.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{validate_create, validate_decide, CreateApprovalInput, DecideInput};
    use crate::domain::approval::{ApprovalScope, ApprovalTarget, Decision};
    use crate::errors::WorkflowError;

    fn create_input() -> CreateApprovalInput {
        CreateApprovalInput {
            scope: "comite_rfp".to_string(),
            proposal_id: Some("prop-001".to_string()),
            tender_id: None,
            approver_email: "a@x.com".to_string(),
            comment: None,
        }
    }

    #[test]
    fn valid_create_produces_typed_values() {
        let validated = validate_create(&create_input()).expect("valid");
        assert_eq!(validated.scope, ApprovalScope::ComiteRfp);
        assert!(matches!(validated.target, ApprovalTarget::Proposal(ref id) if id.0 == "prop-001"));
        assert_eq!(validated.approver_email, "a@x.com");
    }

    #[test]
    fn both_targets_violate_exclusivity() {
        let mut input = create_input();
        input.tender_id = Some("tender-001".to_string());
        let error = validate_create(&input).unwrap_err();
        assert_eq!(
            error,
            WorkflowError::InvalidInput {
                fields: vec!["proposal_id".to_string(), "tender_id".to_string()]
            }
        );
    }

    #[test]
    fn neither_target_violates_exclusivity() {
        let mut input = create_input();
        input.proposal_id = None;
        let error = validate_create(&input).unwrap_err();
        assert!(matches!(error, WorkflowError::InvalidInput { ref fields } if fields.len() == 2));
    }

    #[test]
    fn blank_target_id_counts_as_absent() {
        let mut input = create_input();
        input.proposal_id = Some("   ".to_string());
        input.tender_id = Some("tender-001".to_string());
        let validated = validate_create(&input).expect("blank proposal id is no target");
        assert!(matches!(validated.target, ApprovalTarget::Tender(_)));
    }

    #[test]
    fn unknown_scope_and_bad_email_are_both_reported() {
        let mut input = create_input();
        input.scope = "legal_review".to_string();
        input.approver_email = "not-an-email".to_string();
        let error = validate_create(&input).unwrap_err();
        assert_eq!(
            error,
            WorkflowError::InvalidInput {
                fields: vec!["scope".to_string(), "approver_email".to_string()]
            }
        );
    }

    #[test]
    fn email_validation_rejects_edge_shapes() {
        for bad in ["", "@x.com", "a@", "a@x", "a b@x.com", "a@x..com", "a@@x.com"] {
            let mut input = create_input();
            input.approver_email = bad.to_string();
            assert!(validate_create(&input).is_err(), "accepted `{bad}`");
        }
    }

    #[test]
    fn create_comment_is_trimmed_and_empty_dropped() {
        let mut input = create_input();
        input.comment = Some("  urgent  ".to_string());
        assert_eq!(validate_create(&input).expect("valid").comment.as_deref(), Some("urgent"));

        input.comment = Some("   ".to_string());
        assert_eq!(validate_create(&input).expect("valid").comment, None);
    }

    #[test]
    fn decide_accepts_only_terminal_decisions() {
        let input = DecideInput {
            token: "deadbeef".to_string(),
            decision: "approved".to_string(),
            comment: None,
        };
        assert_eq!(validate_decide(&input).expect("valid").decision, Decision::Approved);

        for bad in ["pending", "escalated", ""] {
            let input = DecideInput {
                token: "deadbeef".to_string(),
                decision: bad.to_string(),
                comment: None,
            };
            let error = validate_decide(&input).unwrap_err();
            assert_eq!(
                error,
                WorkflowError::InvalidInput { fields: vec!["decision".to_string()] }
            );
        }
    }

    #[test]
    fn decide_requires_a_token() {
        let input =
            DecideInput { token: "  ".to_string(), decision: "rejected".to_string(), comment: None };
        let error = validate_decide(&input).unwrap_err();
        assert_eq!(error, WorkflowError::InvalidInput { fields: vec!["token".to_string()] });
    }
}
