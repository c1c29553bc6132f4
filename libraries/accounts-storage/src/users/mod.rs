//! User management and listing queries

use crate::{roles, timestamp};
use accounts_core::{
    error::Result,
    query::{SortField, UserListQuery, UserPage},
    AccountError, NewUser, Role, UpdateUser, User, UserCredentials, UserId,
};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqlitePool};

const USER_COLUMNS: &str = "u.id, u.name, u.age, u.email, u.created_at, u.updated_at";

/// Build a user from a row; roles are loaded separately
fn user_from_row(row: &SqliteRow) -> Result<User> {
    let age: i64 = row.try_get("age")?;

    Ok(User {
        id: UserId::new(row.try_get::<String, _>("id")?),
        name: row.try_get("name")?,
        age: u32::try_from(age).map_err(|_| AccountError::storage(format!("Invalid age: {age}")))?,
        email: row.try_get("email")?,
        roles: Vec::new(),
        created_at: timestamp(row.try_get("created_at")?)?,
        updated_at: timestamp(row.try_get("updated_at")?)?,
    })
}

/// Report a unique violation on insert/update as a duplicate email
fn email_conflict(err: sqlx::Error) -> AccountError {
    match AccountError::from(err) {
        AccountError::Conflict(_) => AccountError::conflict("email", "Email is not unique"),
        other => other,
    }
}

/// Case-folded copy stored next to a searchable column
fn folded(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Create a user holding the `User` role
///
/// The user row, its credentials and the default role are written in one transaction.
pub async fn create(pool: &SqlitePool, user: NewUser) -> Result<User> {
    let id = UserId::generate();
    let now = Utc::now().timestamp();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO users (id, name, age, email, name_lc, email_lc, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id.as_str())
    .bind(user.name.trim())
    .bind(i64::from(user.age))
    .bind(user.email.trim())
    .bind(folded(&user.name))
    .bind(folded(&user.email))
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(email_conflict)?;

    sqlx::query("INSERT INTO user_credentials (user_id, password_hash, updated_at) VALUES (?, ?, ?)")
        .bind(id.as_str())
        .bind(&user.password_hash)
        .bind(now)
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES (?, ?)")
        .bind(id.as_str())
        .bind(Role::User.ordinal())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    get_by_id(pool, &id)
        .await?
        .ok_or_else(|| AccountError::storage("Failed to retrieve created user"))
}

/// Get user by ID, roles included
pub async fn get_by_id(pool: &SqlitePool, id: &UserId) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?"))
        .bind(id.as_str())
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut user = user_from_row(&row)?;
    user.roles = roles::get_for_user(pool, &user.id).await?;
    Ok(Some(user))
}

/// Get a user with its password hash by email (case-insensitive)
pub async fn find_credentials_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<UserCredentials>> {
    let row = sqlx::query(&format!(
        "SELECT {USER_COLUMNS}, c.password_hash
         FROM users u
         INNER JOIN user_credentials c ON c.user_id = u.id
         WHERE u.email = ? COLLATE NOCASE"
    ))
    .bind(email.trim())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut user = user_from_row(&row)?;
    user.roles = roles::get_for_user(pool, &user.id).await?;
    Ok(Some(UserCredentials {
        user,
        password_hash: row.try_get("password_hash")?,
    }))
}

/// Overwrite every mutable field of a user
///
/// Returns `None` when the user does not exist.
pub async fn update(pool: &SqlitePool, id: &UserId, update: UpdateUser) -> Result<Option<User>> {
    let now = Utc::now().timestamp();

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE users
         SET name = ?, age = ?, email = ?, name_lc = ?, email_lc = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(update.name.trim())
    .bind(i64::from(update.age))
    .bind(update.email.trim())
    .bind(folded(&update.name))
    .bind(folded(&update.email))
    .bind(now)
    .bind(id.as_str())
    .execute(&mut *tx)
    .await
    .map_err(email_conflict)?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    sqlx::query(
        "INSERT INTO user_credentials (user_id, password_hash, updated_at)
         VALUES (?, ?, ?)
         ON CONFLICT(user_id)
         DO UPDATE SET password_hash = excluded.password_hash, updated_at = excluded.updated_at",
    )
    .bind(id.as_str())
    .bind(&update.password_hash)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    get_by_id(pool, id).await
}

/// Delete a user
///
/// Credentials, role associations and access tokens go with it (`ON DELETE CASCADE`).
pub async fn delete(pool: &SqlitePool, id: &UserId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id.as_str())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Check whether an account other than `exclude` uses `email`
pub async fn email_exists(pool: &SqlitePool, email: &str, exclude: Option<&UserId>) -> Result<bool> {
    let exclude = exclude.map(UserId::as_str);
    let row = sqlx::query(
        "SELECT EXISTS(
             SELECT 1 FROM users
             WHERE email = ? COLLATE NOCASE AND (? IS NULL OR id <> ?)
         ) AS taken",
    )
    .bind(email.trim())
    .bind(exclude)
    .bind(exclude)
    .fetch_one(pool)
    .await?;

    Ok(row.try_get::<i64, _>("taken")? != 0)
}

/// Get password hashes of every account other than `exclude`
pub async fn password_hashes(pool: &SqlitePool, exclude: Option<&UserId>) -> Result<Vec<String>> {
    let exclude = exclude.map(UserId::as_str);
    let rows = sqlx::query(
        "SELECT password_hash FROM user_credentials WHERE (? IS NULL OR user_id <> ?)",
    )
    .bind(exclude)
    .bind(exclude)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| row.try_get::<String, _>("password_hash").map_err(AccountError::from))
        .collect()
}

/// SQL expression a listing is ordered by
fn order_expression(field: SortField) -> &'static str {
    match field {
        SortField::Id => "u.id",
        SortField::Name => "u.name_lc",
        SortField::Email => "u.email_lc",
        SortField::Age => "u.age",
        // Most privileged role wins; users without roles sort first
        SortField::Role => {
            "(SELECT COALESCE(MAX(ur.role_id), -1) FROM user_roles ur WHERE ur.user_id = u.id)"
        }
    }
}

/// Append the name/email/age substring filter
///
/// `pattern` is already lowercased; it is matched against the folded columns.
fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, pattern: Option<&str>) {
    let Some(pattern) = pattern else {
        return;
    };

    builder.push(" WHERE (u.name_lc LIKE ");
    builder.push_bind(pattern.to_string());
    builder.push(" ESCAPE '\\' OR u.email_lc LIKE ");
    builder.push_bind(pattern.to_string());
    builder.push(" ESCAPE '\\' OR CAST(u.age AS TEXT) LIKE ");
    builder.push_bind(pattern.to_string());
    builder.push(" ESCAPE '\\')");
}

/// Execute a listing plan: filter, then sort, then skip/take
///
/// Roles for the whole page are loaded with one extra query.
pub async fn list(pool: &SqlitePool, query: &UserListQuery) -> Result<UserPage> {
    let pattern = query.like_pattern();

    let mut count: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) AS total FROM users u");
    push_filter(&mut count, pattern.as_deref());
    let total: i64 = count.build().fetch_one(pool).await?.try_get("total")?;

    let mut select: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users u"));
    push_filter(&mut select, pattern.as_deref());
    select.push(format!(
        " ORDER BY {} {}, u.id ASC LIMIT ",
        order_expression(query.order_by),
        query.direction.as_sql()
    ));
    select.push_bind(i64::from(query.limit));
    select.push(" OFFSET ");
    select.push_bind(i64::try_from(query.offset).unwrap_or(i64::MAX));

    tracing::debug!("Listing users: {}", select.sql());

    let rows = select.build().fetch_all(pool).await?;
    let mut users = rows.iter().map(user_from_row).collect::<Result<Vec<_>>>()?;

    let ids: Vec<UserId> = users.iter().map(|u| u.id.clone()).collect();
    let mut roles_by_user = roles::get_for_users(pool, &ids).await?;
    for user in &mut users {
        user.roles = roles_by_user.remove(&user.id).unwrap_or_default();
    }

    Ok(UserPage {
        users,
        total: u64::try_from(total).unwrap_or_default(),
        limit: query.limit,
        offset: query.offset,
    })
}

