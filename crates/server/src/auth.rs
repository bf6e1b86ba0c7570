//! Identity extraction from gateway-forwarded headers.
//!
//! Authentication lives upstream; the gateway forwards `x-user-id`,
//! `x-user-role` and `x-user-email` on every authenticated request. The
//! extractor reduces them to an explicit `AuthContext`; any missing or
//! malformed header is a 401, never a guessed identity.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use procura_core::auth::{AuthContext, Role};
use procura_core::errors::WorkflowError;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Extractor wrapper: handlers take `Identity` and thread the inner
/// `AuthContext` into the operations that need it.
#[derive(Clone, Debug)]
pub struct Identity(pub AuthContext);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, USER_ID_HEADER)?;
        let role_raw = header_value(parts, USER_ROLE_HEADER)?;
        let email = header_value(parts, USER_EMAIL_HEADER)?;

        let role = Role::parse(&role_raw).ok_or(ApiError(WorkflowError::Unauthenticated))?;

        Ok(Identity(AuthContext { user_id, role, email }))
    }
}

fn header_value(parts: &Parts, name: &str) -> Result<String, ApiError> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or(ApiError(WorkflowError::Unauthenticated))
}

#[cfg(test)]
mod tests {
    use axum::extract::FromRequestParts;
    use axum::http::Request;

    use procura_core::auth::Role;

    use super::Identity;

    async fn extract(builder: axum::http::request::Builder) -> Result<Identity, ()> {
        let request = builder.body(()).expect("request builds");
        let (mut parts, ()) = request.into_parts();
        Identity::from_request_parts(&mut parts, &()).await.map_err(|_| ())
    }

    #[tokio::test]
    async fn full_headers_resolve_an_identity() {
        let identity = extract(
            Request::builder()
                .header("x-user-id", "u-42")
                .header("x-user-role", "Admin")
                .header("x-user-email", "ops@procura.local"),
        )
        .await
        .expect("identity");

        assert_eq!(identity.0.user_id, "u-42");
        assert_eq!(identity.0.role, Role::Admin);
        assert_eq!(identity.0.email, "ops@procura.local");
    }

    #[tokio::test]
    async fn missing_any_header_is_rejected() {
        let result = extract(
            Request::builder()
                .header("x-user-id", "u-42")
                .header("x-user-role", "supplier"),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn unknown_role_is_rejected() {
        let result = extract(
            Request::builder()
                .header("x-user-id", "u-42")
                .header("x-user-role", "superuser")
                .header("x-user-email", "a@x.com"),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn blank_header_values_are_rejected() {
        let result = extract(
            Request::builder()
                .header("x-user-id", "  ")
                .header("x-user-role", "admin")
                .header("x-user-email", "a@x.com"),
        )
        .await;
        assert!(result.is_err());
    }
}
