use thiserror::Error;

/// Failure taxonomy for the approval workflow. Every public operation
/// reports one of these; callers map them to transport status codes.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("caller role does not permit this operation")]
    Forbidden,
    #[error("invalid input: {}", fields.join(", "))]
    InvalidInput { fields: Vec<String> },
    #[error("{0}")]
    NotFound(String),
    #[error("approval already exists for this scope and target")]
    Conflict,
    #[error("approval token has expired")]
    Gone,
    #[error("internal failure: {0}")]
    Internal(String),
}

impl WorkflowError {
    pub fn invalid(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::InvalidInput { fields: fields.into_iter().map(Into::into).collect() }
    }

    /// Machine-stable discriminant for error envelopes and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::InvalidInput { .. } => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::Conflict => "conflict",
            Self::Gone => "gone",
            Self::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::WorkflowError;

    #[test]
    fn invalid_input_lists_violated_fields_in_message() {
        let error = WorkflowError::invalid(["scope", "approver_email"]);
        assert_eq!(error.kind(), "invalid_input");
        assert_eq!(error.to_string(), "invalid input: scope, approver_email");
    }

    #[test]
    fn kinds_are_stable_strings() {
        assert_eq!(WorkflowError::Conflict.kind(), "conflict");
        assert_eq!(WorkflowError::Gone.kind(), "gone");
        assert_eq!(WorkflowError::NotFound("proposal `p-1` not found".into()).kind(), "not_found");
        assert_eq!(WorkflowError::Internal("db down".into()).kind(), "internal");
    }
}
