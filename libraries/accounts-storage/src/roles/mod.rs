//! Role queries
//!
//! The `roles` table is seeded by migration; this slice only reads it and manages
//! the `user_roles` associations.

use crate::StorageError;
use accounts_core::{error::Result, AccountError, Role, UserId};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::HashMap;

fn role_from_ordinal(ordinal: i64) -> Result<Role> {
    Role::from_ordinal(ordinal)
        .ok_or_else(|| AccountError::storage(format!("Unknown role ordinal: {ordinal}")))
}

/// Check that the seeded table matches [`Role::ALL`]
///
/// # Errors
///
/// Returns `RoleSeed` if a role is missing, renamed, or unknown.
pub async fn verify_seed(pool: &SqlitePool) -> std::result::Result<(), StorageError> {
    let rows = sqlx::query("SELECT id, name FROM roles ORDER BY id")
        .fetch_all(pool)
        .await?;

    let mut seeded = HashMap::new();
    for row in &rows {
        seeded.insert(row.try_get::<i64, _>("id")?, row.try_get::<String, _>("name")?);
    }

    for role in Role::ALL {
        match seeded.remove(&role.ordinal()) {
            Some(name) if name == role.name() => {}
            Some(name) => {
                return Err(StorageError::RoleSeed(format!(
                    "ordinal {} is named {name}, expected {role}",
                    role.ordinal()
                )))
            }
            None => return Err(StorageError::RoleSeed(format!("{role} is missing"))),
        }
    }

    if let Some((ordinal, name)) = seeded.into_iter().next() {
        return Err(StorageError::RoleSeed(format!("unexpected role {name} ({ordinal})")));
    }

    Ok(())
}

/// Get roles held by a user, sorted by ordinal
pub async fn get_for_user(pool: &SqlitePool, user_id: &UserId) -> Result<Vec<Role>> {
    let rows = sqlx::query("SELECT role_id FROM user_roles WHERE user_id = ? ORDER BY role_id")
        .bind(user_id.as_str())
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| role_from_ordinal(row.try_get("role_id")?))
        .collect()
}

/// Get roles for many users in one query, keyed by user id
pub async fn get_for_users(
    pool: &SqlitePool,
    user_ids: &[UserId],
) -> Result<HashMap<UserId, Vec<Role>>> {
    let mut roles: HashMap<UserId, Vec<Role>> = HashMap::new();
    if user_ids.is_empty() {
        return Ok(roles);
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT user_id, role_id FROM user_roles WHERE user_id IN (");
    let mut separated = builder.separated(", ");
    for id in user_ids {
        separated.push_bind(id.as_str().to_string());
    }
    separated.push_unseparated(") ORDER BY role_id");

    let rows = builder.build().fetch_all(pool).await?;
    for row in &rows {
        let user_id = UserId::new(row.try_get::<String, _>("user_id")?);
        let role = role_from_ordinal(row.try_get("role_id")?)?;
        roles.entry(user_id).or_default().push(role);
    }

    Ok(roles)
}

/// Add a role to a user
///
/// The existence check and the insert are one statement, so a concurrent delete
/// cannot trip the foreign key. Returns `false` when the user already held the
/// role or does not exist.
pub async fn add_to_user(pool: &SqlitePool, user_id: &UserId, role: Role) -> Result<bool> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO user_roles (user_id, role_id)
         SELECT ?, ? WHERE EXISTS (SELECT 1 FROM users WHERE id = ?)",
    )
    .bind(user_id.as_str())
    .bind(role.ordinal())
    .bind(user_id.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
