use rusqlite::{params, Connection, OptionalExtension};

use crate::db::StoreError;

/// A stored bearer token, keyed by its public id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRow {
    pub token_id: String,
    pub secret_hash: String,
    pub user_id: String,
    pub issued_at: String,
    pub expires_at: Option<String>,
    pub revoked: bool,
}

pub fn insert_token(conn: &Connection, row: &TokenRow) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO api_tokens (token_id, secret_hash, user_id, issued_at, expires_at, revoked)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            row.token_id,
            row.secret_hash,
            row.user_id,
            row.issued_at,
            row.expires_at,
            row.revoked as i32,
        ],
    )?;
    Ok(())
}

pub fn find_token_by_id(conn: &Connection, token_id: &str) -> Result<Option<TokenRow>, StoreError> {
    let row = conn
        .query_row(
            "SELECT token_id, secret_hash, user_id, issued_at, expires_at, revoked
             FROM api_tokens WHERE token_id = ?1",
            params![token_id],
            |row| {
                Ok(TokenRow {
                    token_id: row.get(0)?,
                    secret_hash: row.get(1)?,
                    user_id: row.get(2)?,
                    issued_at: row.get(3)?,
                    expires_at: row.get(4)?,
                    revoked: row.get::<_, i32>(5)? != 0,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Revoke every live token for a user. Returns how many were revoked.
pub fn revoke_tokens_for_user(conn: &Connection, user_id: &str) -> Result<usize, StoreError> {
    let count = conn.execute(
        "UPDATE api_tokens SET revoked = 1 WHERE user_id = ?1 AND revoked = 0",
        params![user_id],
    )?;
    Ok(count)
}
