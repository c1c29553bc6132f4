//! Storage trait for account persistence

use crate::error::Result;
use crate::query::{UserListQuery, UserPage};
use crate::types::{AccessToken, NewUser, Role, UpdateUser, User, UserCredentials, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Storage context providing access to account data
///
/// Lookups return `Ok(None)` (or `false`) for missing users; turning that into
/// `UserNotFound` is the service layer's job.
#[async_trait]
pub trait AccountStore: Send + Sync {
    // ========================================================================
    // Users
    // ========================================================================

    /// Insert a user holding the `User` role
    ///
    /// Fails with `Conflict` when the email is already taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Get user by ID, roles included
    async fn get_user(&self, id: &UserId) -> Result<Option<User>>;

    /// Get a user and its password hash by email
    async fn find_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>>;

    /// Overwrite every mutable field of a user
    async fn update_user(&self, id: &UserId, update: UpdateUser) -> Result<Option<User>>;

    /// Delete a user, its role associations and its tokens
    async fn delete_user(&self, id: &UserId) -> Result<bool>;

    /// Execute a listing plan
    async fn list_users(&self, query: &UserListQuery) -> Result<UserPage>;

    /// Whether an account other than `exclude` uses `email`
    async fn email_exists(&self, email: &str, exclude: Option<&UserId>) -> Result<bool>;

    /// Password hashes of every account other than `exclude`
    async fn password_hashes(&self, exclude: Option<&UserId>) -> Result<Vec<String>>;

    // ========================================================================
    // Roles
    // ========================================================================

    /// Grant a role; granting a held role is a no-op
    async fn add_role(&self, id: &UserId, role: Role) -> Result<Option<User>>;

    // ========================================================================
    // Access tokens
    // ========================================================================

    /// Record an issued token
    async fn save_access_token(&self, token: &AccessToken) -> Result<()>;

    /// Whether `token` is recorded and unexpired at `now`
    async fn is_token_active(&self, token: &str, now: DateTime<Utc>) -> Result<bool>;

    /// Forget a token; returns whether it was recorded
    async fn revoke_access_token(&self, token: &str) -> Result<bool>;

    /// Tokens recorded for a user, newest first
    async fn get_user_tokens(&self, id: &UserId) -> Result<Vec<AccessToken>>;

    /// Delete tokens expired at `now`; returns how many were removed
    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64>;
}
