//! Accounts Storage
//!
//! `SQLite` database layer for the accounts service.
//!
//! # Architecture
//!
//! - **Vertical Slicing**: Each feature owns its own queries (`users`, `roles`, `access_tokens`)
//! - **Constraints First**: Uniqueness and cascades live in the schema, not only in code
//! - **Context**: `LocalStorageContext` implements `accounts_core::AccountStore` on top of the slices
//!
//! # Example
//!
//! ```rust,no_run
//! use accounts_core::{AccountStore, ListUsersParams, PageLimits, UserListQuery};
//! use accounts_storage::{create_pool, run_migrations, LocalStorageContext};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create database connection
//! let pool = create_pool("sqlite://accounts.db", 5).await?;
//! run_migrations(&pool).await?;
//!
//! let storage = LocalStorageContext::new(pool);
//!
//! // First page of users, ordered by name
//! let query = UserListQuery::from_params(&ListUsersParams::default(), PageLimits::default())?;
//! let page = storage.list_users(&query).await?;
//! # Ok(())
//! # }
//! ```

mod context;
mod error;

// Vertical slices
pub mod access_tokens;
pub mod roles;
pub mod users;

pub use context::LocalStorageContext;
pub use error::StorageError;

use accounts_core::{AccountError, Result};
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;
use std::path::PathBuf;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// This should be called once when the application starts to ensure
/// the database schema is up to date.
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Create a new `SQLite` pool
///
/// Every connection gets its own in-memory database with `sqlite::memory:`, so
/// use a file URL whenever `max_connections > 1`.
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://accounts.db>`)
/// * `max_connections` - Pool size
///
/// # Errors
///
/// Returns an error if the connection fails
pub async fn create_pool(
    database_url: &str,
    max_connections: u32,
) -> std::result::Result<SqlitePool, sqlx::Error> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!("Creating pool with URL: {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true) // cascades on user deletion depend on this
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await?;

    tracing::debug!("Pool created");

    Ok(pool)
}

/// File behind a `SQLite` URL, or `None` for in-memory databases
pub fn database_path(database_url: &str) -> Option<PathBuf> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let (path, params) = rest.split_once('?').unwrap_or((rest, ""));

    if path.is_empty() || path == ":memory:" || params.contains("mode=memory") {
        return None;
    }
    Some(PathBuf::from(path))
}

/// Create the directory a file database lives in
///
/// `create_if_missing` creates the file but not its parent directories.
///
/// # Errors
///
/// Returns an error if the directory cannot be created
pub async fn ensure_database_dir(database_url: &str) -> std::io::Result<()> {
    let Some(path) = database_path(database_url) else {
        return Ok(());
    };

    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            tokio::fs::create_dir_all(parent).await?;
            tracing::debug!("Database directory ready: {}", parent.display());
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Decode a unix timestamp column
pub(crate) fn timestamp(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| AccountError::storage("Invalid timestamp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn database_path_skips_memory_urls() {
        assert_eq!(
            database_path("sqlite://./data/accounts.db").as_deref(),
            Some(Path::new("./data/accounts.db"))
        );
        assert_eq!(
            database_path("sqlite:accounts.db?mode=rwc").as_deref(),
            Some(Path::new("accounts.db"))
        );
        assert_eq!(database_path("sqlite::memory:"), None);
        assert_eq!(database_path("sqlite://shared?mode=memory&cache=shared"), None);
        assert_eq!(database_path("postgres://localhost/db"), None);
    }

    #[tokio::test]
    async fn open_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("data").join("nested").join("accounts.db");
        let url = format!("sqlite://{}", db_path.display());

        let store = LocalStorageContext::open(&url, 2).await.unwrap();
        store.pool().close().await;

        assert!(db_path.exists());
    }
}
