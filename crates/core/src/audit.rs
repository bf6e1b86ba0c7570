//! Immutable audit events for approval creation and decisions.
//!
//! Emission is best-effort by contract: persistence failures are logged and
//! swallowed by the caller, never surfaced to the business operation. Tokens
//! appear only as a redacted prefix in payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub actor: Option<String>,
    pub payload: Value,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        action: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            action: action.into(),
            actor: None,
            payload,
            occurred_at: Utc::now(),
        }
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::AuditEvent;

    #[test]
    fn events_get_unique_ids_and_carry_payloads() {
        let first = AuditEvent::new("approval", "apr-1", "created", json!({"scope": "comite_rfp"}));
        let second = AuditEvent::new("approval", "apr-1", "created", json!({}));

        assert_ne!(first.id, second.id);
        assert_eq!(first.entity_type, "approval");
        assert_eq!(first.payload["scope"], "comite_rfp");
        assert_eq!(first.actor, None);
    }

    #[test]
    fn with_actor_attributes_the_event() {
        let event =
            AuditEvent::new("approval", "apr-1", "approved", json!({})).with_actor("u-admin");
        assert_eq!(event.actor.as_deref(), Some("u-admin"));
    }
}
