/// Storage-specific errors
use thiserror::Error;

/// Storage error types, raised while opening and preparing the database
#[derive(Error, Debug)]
pub enum StorageError {
    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The `roles` table does not match the fixed role set
    #[error("Role seed mismatch: {0}")]
    RoleSeed(String),

    /// The database directory could not be created
    #[error("Database directory error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error from `SQLx`
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// Error raised by a storage slice
    #[error(transparent)]
    Account(#[from] accounts_core::AccountError),
}

impl From<StorageError> for accounts_core::AccountError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Account(inner) => inner,
            other => accounts_core::AccountError::storage(other.to_string()),
        }
    }
}
