//! Caller identity threaded explicitly into every operation that needs it.
//!
//! Authentication itself happens upstream; by the time a request reaches the
//! workflow it has been reduced to (user id, role, email). Nothing in this
//! crate reads identity from ambient state.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Supplier,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Supplier => "supplier",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "supplier" => Some(Self::Supplier),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: String,
    pub role: Role,
    pub email: String,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthContext, Role};

    #[test]
    fn role_parse_is_case_insensitive_and_closed() {
        assert_eq!(Role::parse("Admin"), Some(Role::Admin));
        assert_eq!(Role::parse(" supplier "), Some(Role::Supplier));
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn only_admin_contexts_are_admin() {
        let admin = AuthContext {
            user_id: "u-1".into(),
            role: Role::Admin,
            email: "ops@procura.local".into(),
        };
        let supplier = AuthContext {
            user_id: "u-2".into(),
            role: Role::Supplier,
            email: "a@x.com".into(),
        };
        assert!(admin.is_admin());
        assert!(!supplier.is_admin());
    }
}
