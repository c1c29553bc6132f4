use crate::{
    access_tokens, create_pool, ensure_database_dir, roles, run_migrations, users, StorageError,
};
use accounts_core::{
    error::Result,
    query::{UserListQuery, UserPage},
    storage::AccountStore,
    AccessToken, NewUser, Role, UpdateUser, User, UserCredentials, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Account storage backed by `SQLite`
#[derive(Clone)]
pub struct LocalStorageContext {
    pool: SqlitePool,
}

impl LocalStorageContext {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the database directory, connect, migrate and check the role seed
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened, migrated, or holds an
    /// unexpected role table.
    pub async fn open(database_url: &str, max_connections: u32) -> std::result::Result<Self, StorageError> {
        ensure_database_dir(database_url).await?;
        let pool = create_pool(database_url, max_connections).await?;
        run_migrations(&pool).await?;
        roles::verify_seed(&pool).await?;

        tracing::info!("Account storage ready at {}", database_url);

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl AccountStore for LocalStorageContext {
    // Users
    async fn create_user(&self, user: NewUser) -> Result<User> {
        users::create(&self.pool, user).await
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        users::get_by_id(&self.pool, id).await
    }

    async fn find_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
        users::find_credentials_by_email(&self.pool, email).await
    }

    async fn update_user(&self, id: &UserId, update: UpdateUser) -> Result<Option<User>> {
        users::update(&self.pool, id, update).await
    }

    async fn delete_user(&self, id: &UserId) -> Result<bool> {
        users::delete(&self.pool, id).await
    }

    async fn list_users(&self, query: &UserListQuery) -> Result<UserPage> {
        users::list(&self.pool, query).await
    }

    async fn email_exists(&self, email: &str, exclude: Option<&UserId>) -> Result<bool> {
        users::email_exists(&self.pool, email, exclude).await
    }

    async fn password_hashes(&self, exclude: Option<&UserId>) -> Result<Vec<String>> {
        users::password_hashes(&self.pool, exclude).await
    }

    // Roles
    async fn add_role(&self, id: &UserId, role: Role) -> Result<Option<User>> {
        if !roles::add_to_user(&self.pool, id, role).await? {
            tracing::debug!("Role {} not granted to user {}: held already or no such user", role, id);
        }

        // None when the user is missing or was deleted after the grant
        users::get_by_id(&self.pool, id).await
    }

    // Access tokens
    async fn save_access_token(&self, token: &AccessToken) -> Result<()> {
        access_tokens::save(&self.pool, token).await
    }

    async fn is_token_active(&self, token: &str, now: DateTime<Utc>) -> Result<bool> {
        access_tokens::is_active(&self.pool, token, now).await
    }

    async fn revoke_access_token(&self, token: &str) -> Result<bool> {
        access_tokens::revoke(&self.pool, token).await
    }

    async fn get_user_tokens(&self, id: &UserId) -> Result<Vec<AccessToken>> {
        access_tokens::get_for_user(&self.pool, id).await
    }

    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64> {
        access_tokens::purge_expired(&self.pool, now).await
    }
}
