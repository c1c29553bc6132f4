//! Access token records
//!
//! Issued tokens are stored so they can be revoked on logout and audited per user.

use crate::timestamp;
use accounts_core::{error::Result, AccessToken, UserId};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

/// Record an issued token
pub async fn save(pool: &SqlitePool, token: &AccessToken) -> Result<()> {
    sqlx::query(
        "INSERT INTO access_tokens (user_id, token, issued_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(token.user_id.as_str())
    .bind(&token.token)
    .bind(token.issued_at.timestamp())
    .bind(token.expires_at.timestamp())
    .execute(pool)
    .await?;

    Ok(())
}

/// Whether `token` is recorded and still valid at `now`
pub async fn is_active(pool: &SqlitePool, token: &str, now: DateTime<Utc>) -> Result<bool> {
    let row = sqlx::query(
        "SELECT EXISTS(SELECT 1 FROM access_tokens WHERE token = ? AND expires_at > ?) AS active",
    )
    .bind(token)
    .bind(now.timestamp())
    .fetch_one(pool)
    .await?;

    Ok(row.try_get::<i64, _>("active")? != 0)
}

/// Delete a token record
///
/// Returns `false` when the token was not recorded.
pub async fn revoke(pool: &SqlitePool, token: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM access_tokens WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Get tokens issued to a user, newest first
pub async fn get_for_user(pool: &SqlitePool, user_id: &UserId) -> Result<Vec<AccessToken>> {
    let rows = sqlx::query(
        "SELECT user_id, token, issued_at, expires_at
         FROM access_tokens
         WHERE user_id = ?
         ORDER BY issued_at DESC, id DESC",
    )
    .bind(user_id.as_str())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<AccessToken> {
            Ok(AccessToken {
                user_id: UserId::new(row.try_get::<String, _>("user_id")?),
                token: row.try_get("token")?,
                issued_at: timestamp(row.try_get("issued_at")?)?,
                expires_at: timestamp(row.try_get("expires_at")?)?,
            })
        })
        .collect()
}

/// Delete every token expired at `now`
pub async fn purge_expired(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM access_tokens WHERE expires_at <= ?")
        .bind(now.timestamp())
        .execute(pool)
        .await?;

    let purged = result.rows_affected();
    if purged > 0 {
        tracing::info!("Purged {} expired access tokens", purged);
    }

    Ok(purged)
}
