//! Transport mapping for workflow failures.
//!
//! Handlers return `ApiError`; the `IntoResponse` impl renders the stable
//! JSON envelope `{"error": {"kind", "message", "fields"?}}` with the status
//! code each failure kind maps to.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use procura_core::errors::WorkflowError;
use procura_db::repositories::RepositoryError;

#[derive(Debug)]
pub struct ApiError(pub WorkflowError);

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            WorkflowError::Unauthenticated => StatusCode::UNAUTHORIZED,
            WorkflowError::Forbidden => StatusCode::FORBIDDEN,
            WorkflowError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
            WorkflowError::Conflict => StatusCode::CONFLICT,
            WorkflowError::Gone => StatusCode::GONE,
            WorkflowError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn envelope(&self) -> ErrorEnvelope {
        let fields = match &self.0 {
            WorkflowError::InvalidInput { fields } => Some(fields.clone()),
            _ => None,
        };
        // Internal details stay in the logs, not on the wire.
        let message = match &self.0 {
            WorkflowError::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        ErrorEnvelope { error: ErrorBody { kind: self.0.kind(), message, fields } }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(error: WorkflowError) -> Self {
        Self(error)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Conflict => Self(WorkflowError::Conflict),
            other => {
                tracing::error!(
                    event_name = "approvals.repository_error",
                    error = %other,
                    "repository operation failed"
                );
                Self(WorkflowError::Internal(other.to_string()))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.envelope())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use procura_core::errors::WorkflowError;
    use procura_db::repositories::RepositoryError;

    use super::ApiError;

    #[test]
    fn workflow_errors_map_to_expected_status_codes() {
        let cases = [
            (WorkflowError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (WorkflowError::Forbidden, StatusCode::FORBIDDEN),
            (WorkflowError::invalid(["scope"]), StatusCode::BAD_REQUEST),
            (WorkflowError::NotFound("missing".into()), StatusCode::NOT_FOUND),
            (WorkflowError::Conflict, StatusCode::CONFLICT),
            (WorkflowError::Gone, StatusCode::GONE),
            (WorkflowError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, expected) in cases {
            assert_eq!(ApiError(error).status_code(), expected);
        }
    }

    #[test]
    fn repository_conflict_becomes_workflow_conflict() {
        let api_error = ApiError::from(RepositoryError::Conflict);
        assert_eq!(api_error.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn internal_message_is_not_leaked() {
        let api_error = ApiError(WorkflowError::Internal("password=hunter2".into()));
        let envelope = api_error.envelope();
        assert_eq!(envelope.error.message, "internal error");
        assert_eq!(envelope.error.kind, "internal");
    }

    #[test]
    fn invalid_input_carries_its_field_list() {
        let api_error = ApiError(WorkflowError::invalid(["scope", "approver_email"]));
        let envelope = api_error.envelope();
        assert_eq!(
            envelope.error.fields,
            Some(vec!["scope".to_string(), "approver_email".to_string()])
        );
    }
}
