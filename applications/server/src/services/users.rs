/// Account operations: registration, login, CRUD, roles and listing
use crate::error::Result;
use crate::services::{AuthService, ExistingAccountUniqueness, NewAccountUniqueness};
use accounts_core::{
    validation::{self, AccountFields},
    AccessToken, AccountError, AccountStore, ListUsersParams, NewUser, PageLimits, Role,
    UpdateUser, User, UserId, UserListQuery, UserPage,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Registration and full-update payload
///
/// Missing fields deserialize as empty so they surface as validation messages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub age: i64,
}

impl AccountRequest {
    fn fields(&self) -> AccountFields<'_> {
        AccountFields {
            name: &self.name,
            email: &self.email,
            password: &self.password,
            age: self.age,
        }
    }

    /// Age after validation succeeded
    fn checked_age(&self) -> Result<u32> {
        u32::try_from(self.age)
            .map_err(|_| AccountError::invalid_input(format!("Invalid age: {}", self.age)).into())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub access_token: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

pub struct UserService {
    store: Arc<dyn AccountStore>,
    auth: Arc<AuthService>,
    limits: PageLimits,
    enforce_unique_passwords: bool,
}

impl UserService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        auth: Arc<AuthService>,
        limits: PageLimits,
        enforce_unique_passwords: bool,
    ) -> Self {
        Self {
            store,
            auth,
            limits,
            enforce_unique_passwords,
        }
    }

    /// Create an account holding the `User` role
    pub async fn register(&self, req: &AccountRequest) -> Result<User> {
        let uniqueness = NewAccountUniqueness {
            store: self.store.as_ref(),
            enforce_unique_passwords: self.enforce_unique_passwords,
        };
        validation::validate_account(&req.fields(), &uniqueness).await?;

        let password_hash = self.auth.hash_password(&req.password).await?;
        let user = self
            .store
            .create_user(NewUser {
                name: req.name.trim().to_string(),
                email: req.email.trim().to_string(),
                age: req.checked_age()?,
                password_hash,
            })
            .await?;

        tracing::info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Check credentials and issue a recorded access token
    pub async fn login(&self, req: &LoginRequest) -> Result<LoginResult> {
        validation::validate_login(&req.email, &req.password)?;

        let Some(credentials) = self.store.find_credentials_by_email(&req.email).await? else {
            tracing::debug!("Login for unknown email");
            return Err(AccountError::InvalidCredentials.into());
        };

        if !self
            .auth
            .verify_password(&req.password, &credentials.password_hash)
            .await?
        {
            tracing::debug!("Wrong password for user {}", credentials.user.id);
            return Err(AccountError::InvalidCredentials.into());
        }

        let user = credentials.user;
        let issued = self.auth.issue_token(&user.id, &user.email)?;

        self.store
            .save_access_token(&AccessToken {
                user_id: user.id.clone(),
                token: issued.token.clone(),
                issued_at: issued.issued_at,
                expires_at: issued.expires_at,
            })
            .await
            .map_err(|e| AccountError::TokenPersistence(e.to_string()))?;

        tracing::info!("User {} logged in", user.id);

        Ok(LoginResult {
            access_token: issued.token,
            user_id: user.id,
            expires_at: issued.expires_at,
        })
    }

    /// Forget a token so it is no longer accepted
    pub async fn logout(&self, token: &str) -> Result<bool> {
        Ok(self.store.revoke_access_token(token).await?)
    }

    pub async fn get_user(&self, id: &UserId) -> Result<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| AccountError::user_not_found(id).into())
    }

    /// Overwrite every field of an existing account
    pub async fn update_user(&self, id: &UserId, req: &AccountRequest) -> Result<User> {
        self.get_user(id).await?;

        let uniqueness = ExistingAccountUniqueness {
            store: self.store.as_ref(),
            enforce_unique_passwords: self.enforce_unique_passwords,
            user_id: id,
        };
        validation::validate_account(&req.fields(), &uniqueness).await?;

        let password_hash = self.auth.hash_password(&req.password).await?;
        let user = self
            .store
            .update_user(
                id,
                UpdateUser {
                    name: req.name.trim().to_string(),
                    email: req.email.trim().to_string(),
                    age: req.checked_age()?,
                    password_hash,
                },
            )
            .await?
            .ok_or_else(|| AccountError::user_not_found(id))?;

        tracing::info!("Updated user {}", user.id);
        Ok(user)
    }

    pub async fn delete_user(&self, id: &UserId) -> Result<()> {
        if !self.store.delete_user(id).await? {
            return Err(AccountError::user_not_found(id).into());
        }

        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    /// Grant a role by name or ordinal
    pub async fn add_role(&self, id: &UserId, role: &str) -> Result<User> {
        self.get_user(id).await?;
        let role: Role = role.parse()?;

        let user = self
            .store
            .add_role(id, role)
            .await?
            .ok_or_else(|| AccountError::user_not_found(id))?;

        tracing::info!("Granted role {} to user {}", role, id);
        Ok(user)
    }

    /// Plan and run a listing from raw parameters
    pub async fn list_users(&self, params: &ListUsersParams) -> Result<UserPage> {
        tracing::debug!("Listing users with {:?}", params);

        let query = UserListQuery::from_params(params, self.limits)?;
        Ok(self.store.list_users(&query).await?)
    }

    /// Drop every expired token record
    pub async fn purge_expired_tokens(&self) -> Result<u64> {
        Ok(self.store.purge_expired_tokens(Utc::now()).await?)
    }
}
