//! Approval token issuance.
//!
//! Tokens are bearer credentials: whoever holds one can record the decision
//! for its approval. They carry 256 bits of OS entropy and are rendered as a
//! fixed-length hex string so they survive copy/paste and URL embedding.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;

pub const TOKEN_BYTES: usize = 32;
pub const TOKEN_HEX_LEN: usize = TOKEN_BYTES * 2;

/// Number of leading characters safe to include in logs and audit payloads.
const PREFIX_LEN: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Mint a fresh token and its expiry, `ttl_days` from now.
///
/// OsRng failure aborts the process; an approval issued from a weak entropy
/// source would be worse than no approval at all.
pub fn issue(ttl_days: i64) -> IssuedToken {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);

    IssuedToken { token: hex::encode(bytes), expires_at: Utc::now() + Duration::days(ttl_days) }
}

/// Redacted form of a token for audit payloads and logs. Never log the full
/// token anywhere.
pub fn token_prefix(token: &str) -> &str {
    &token[..token.len().min(PREFIX_LEN)]
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{issue, token_prefix, TOKEN_HEX_LEN};

    #[test]
    fn issued_token_is_64_lowercase_hex_chars() {
        let issued = issue(7);
        assert_eq!(issued.token.len(), TOKEN_HEX_LEN);
        assert!(issued.token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn expiry_is_ttl_days_from_now() {
        let before = Utc::now() + Duration::days(7);
        let issued = issue(7);
        let after = Utc::now() + Duration::days(7);
        assert!(issued.expires_at >= before && issued.expires_at <= after);
    }

    #[test]
    fn consecutive_tokens_differ() {
        assert_ne!(issue(7).token, issue(7).token);
    }

    #[test]
    fn prefix_redacts_to_eight_chars() {
        let issued = issue(7);
        let prefix = token_prefix(&issued.token);
        assert_eq!(prefix.len(), 8);
        assert!(issued.token.starts_with(prefix));
        assert_eq!(token_prefix("abc"), "abc");
    }
}
