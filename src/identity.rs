//! Bearer-token identity.
//!
//! The HTTP layer only sees [`IdentityProvider`]. [`TokenIdentityProvider`]
//! is the local implementation. A token reads `<token_id>.<secret>`; the id
//! selects the `api_tokens` row and the secret is checked against its stored
//! SHA-256 in constant time. Tokens may expire and are revocable per user.

use std::sync::Arc;

use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::db::{self, Database, StoreError, TokenRow};

/// The verified caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing or malformed Authorization header")]
    MissingCredentials,
    #[error("Token not recognized")]
    InvalidToken,
    #[error("Token expired")]
    Expired,
    #[error("Identity store error: {0}")]
    Store(#[from] StoreError),
}

/// Verifies bearer tokens. Implementations must not log token material.
pub trait IdentityProvider: Send + Sync {
    fn verify_token(&self, token: &str) -> Result<Identity, AuthError>;
}

/// Extract the token from an `Authorization` header value.
///
/// The value must split on whitespace into exactly two parts, the first
/// being literally `Bearer`.
pub fn parse_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredentials)?;
    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Ok(token),
        _ => Err(AuthError::MissingCredentials),
    }
}

/// Parse the header and verify the token in one step.
pub fn authenticate(
    provider: &dyn IdentityProvider,
    header: Option<&str>,
) -> Result<Identity, AuthError> {
    let token = parse_bearer(header)?;
    provider.verify_token(token)
}

const TOKEN_SEPARATOR: char = '.';

/// SHA-256 of a token secret, base64-encoded for storage.
pub fn hash_secret(secret: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
}

fn random_url_safe<const N: usize>() -> String {
    let mut bytes = [0u8; N];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a fresh `(token_id, secret)` pair: 16 and 32 random bytes,
/// URL-safe base64. Neither half can contain the separator.
pub fn generate_token() -> (String, String) {
    (random_url_safe::<16>(), random_url_safe::<32>())
}

/// Split a presented token into its id and secret.
pub fn split_token(token: &str) -> Option<(&str, &str)> {
    match token.split_once(TOKEN_SEPARATOR) {
        Some((id, secret)) if !id.is_empty() && !secret.is_empty() => Some((id, secret)),
        _ => None,
    }
}

/// Identity provider backed by the `api_tokens` table.
pub struct TokenIdentityProvider {
    db: Arc<Database>,
}

impl TokenIdentityProvider {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Mint a token for `user_id`. The raw token is returned once and
    /// never stored.
    pub fn issue_token(
        &self,
        user_id: &str,
        ttl: Option<chrono::Duration>,
    ) -> Result<String, StoreError> {
        let (token_id, secret) = generate_token();
        let now = Utc::now();
        let row = TokenRow {
            secret_hash: hash_secret(&secret),
            token_id,
            user_id: user_id.to_string(),
            issued_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            expires_at: ttl.map(|ttl| (now + ttl).to_rfc3339_opts(SecondsFormat::Millis, true)),
            revoked: false,
        };
        self.db.with_conn(|conn| db::insert_token(conn, &row))?;
        tracing::info!(user = %user_id, token_id = %row.token_id, "Issued API token");
        Ok(format!("{}{TOKEN_SEPARATOR}{secret}", row.token_id))
    }

    /// Revoke every token belonging to `user_id`.
    pub fn revoke_user_tokens(&self, user_id: &str) -> Result<usize, StoreError> {
        let count = self
            .db
            .with_conn(|conn| db::revoke_tokens_for_user(conn, user_id))?;
        tracing::info!(user = %user_id, count, "Revoked API tokens");
        Ok(count)
    }
}

impl IdentityProvider for TokenIdentityProvider {
    fn verify_token(&self, token: &str) -> Result<Identity, AuthError> {
        let (token_id, secret) = split_token(token).ok_or(AuthError::InvalidToken)?;
        let row = self
            .db
            .with_conn(|conn| db::find_token_by_id(conn, token_id))?
            .ok_or(AuthError::InvalidToken)?;

        let presented = hash_secret(secret);
        let secret_matches: bool = row.secret_hash.as_bytes().ct_eq(presented.as_bytes()).into();
        if !secret_matches || row.revoked {
            return Err(AuthError::InvalidToken);
        }

        if let Some(expires_at) = &row.expires_at {
            let expires_at = DateTime::parse_from_rfc3339(expires_at)
                .map_err(|_| AuthError::InvalidToken)?;
            if expires_at <= Utc::now() {
                return Err(AuthError::Expired);
            }
        }

        Ok(Identity {
            user_id: row.user_id,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Fixed token → user map for handler tests.
    pub(crate) struct StaticIdentityProvider(pub HashMap<String, String>);

    impl StaticIdentityProvider {
        pub(crate) fn with(pairs: &[(&str, &str)]) -> Self {
            Self(
                pairs
                    .iter()
                    .map(|(t, u)| (t.to_string(), u.to_string()))
                    .collect(),
            )
        }
    }

    impl IdentityProvider for StaticIdentityProvider {
        fn verify_token(&self, token: &str) -> Result<Identity, AuthError> {
            self.0
                .get(token)
                .map(|user_id| Identity {
                    user_id: user_id.clone(),
                })
                .ok_or(AuthError::InvalidToken)
        }
    }

    fn provider() -> TokenIdentityProvider {
        TokenIdentityProvider::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    #[test]
    fn parse_bearer_accepts_two_part_header() {
        assert_eq!(parse_bearer(Some("Bearer abc")).unwrap(), "abc");
        assert_eq!(parse_bearer(Some("  Bearer   abc ")).unwrap(), "abc");
    }

    #[test]
    fn parse_bearer_rejects_malformed_headers() {
        for header in [None, Some(""), Some("Bearer"), Some("Token abc"), Some("bearer abc"), Some("Bearer a b")] {
            assert!(
                matches!(parse_bearer(header), Err(AuthError::MissingCredentials)),
                "{header:?} should be rejected"
            );
        }
    }

    #[test]
    fn generate_token_is_unique() {
        let (id1, secret1) = generate_token();
        let (id2, secret2) = generate_token();
        assert_ne!(id1, id2);
        assert_ne!(secret1, secret2);
        assert!(!id1.contains(TOKEN_SEPARATOR) && !secret1.contains(TOKEN_SEPARATOR));
    }

    #[test]
    fn hash_secret_is_deterministic() {
        assert_eq!(hash_secret("test"), hash_secret("test"));
        assert_ne!(hash_secret("token-a"), hash_secret("token-b"));
    }

    #[test]
    fn split_token_needs_both_halves() {
        assert_eq!(split_token("abc.def"), Some(("abc", "def")));
        for token in ["abcdef", ".def", "abc.", "."] {
            assert_eq!(split_token(token), None, "{token:?}");
        }
    }

    #[test]
    fn issued_token_verifies_to_its_user() {
        let provider = provider();
        let token = provider.issue_token("alice", None).unwrap();

        let identity = provider.verify_token(&token).unwrap();
        assert_eq!(identity.user_id, "alice");

        let via_header = authenticate(&provider, Some(&format!("Bearer {token}"))).unwrap();
        assert_eq!(via_header, identity);
    }

    #[test]
    fn unknown_token_rejected() {
        let provider = provider();
        provider.issue_token("alice", None).unwrap();
        assert!(matches!(provider.verify_token("nope"), Err(AuthError::InvalidToken)));
        assert!(matches!(provider.verify_token("nope.nope"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn known_id_with_wrong_secret_rejected() {
        let provider = provider();
        let token = provider.issue_token("alice", None).unwrap();
        let (token_id, secret) = split_token(&token).unwrap();

        let (_, other_secret) = generate_token();
        let forged = format!("{token_id}.{other_secret}");
        assert!(matches!(provider.verify_token(&forged), Err(AuthError::InvalidToken)));

        let truncated = format!("{token_id}.{}", &secret[1..]);
        assert!(matches!(provider.verify_token(&truncated), Err(AuthError::InvalidToken)));

        assert!(provider.verify_token(&token).is_ok());
    }

    #[test]
    fn revoked_token_rejected() {
        let provider = provider();
        let token = provider.issue_token("alice", None).unwrap();
        assert_eq!(provider.revoke_user_tokens("alice").unwrap(), 1);
        assert!(matches!(provider.verify_token(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn expired_token_rejected() {
        let provider = provider();
        let token = provider
            .issue_token("alice", Some(chrono::Duration::seconds(-1)))
            .unwrap();
        assert!(matches!(provider.verify_token(&token), Err(AuthError::Expired)));

        let fresh = provider
            .issue_token("alice", Some(chrono::Duration::days(30)))
            .unwrap();
        assert!(provider.verify_token(&fresh).is_ok());
    }

    #[test]
    fn secret_is_never_stored() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let provider = TokenIdentityProvider::new(db.clone());
        let token = provider.issue_token("alice", None).unwrap();
        let (token_id, secret) = split_token(&token).unwrap();

        let (stored_id, stored_hash): (String, String) = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT token_id, secret_hash FROM api_tokens WHERE user_id = 'alice'",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?)
            })
            .unwrap();
        assert_eq!(stored_id, token_id);
        assert_eq!(stored_hash, hash_secret(secret));
        assert_ne!(stored_hash, secret);
        assert!(!stored_hash.contains(secret) && !stored_hash.contains(&token));
    }
}
