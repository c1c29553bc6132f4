/// Uniqueness checks backed by the account store
use accounts_core::{error::Result, AccountError, AccountStore, UniquenessCheck, UserId};
use async_trait::async_trait;

/// Uniqueness for a registration: every stored account counts
pub struct NewAccountUniqueness<'a> {
    pub store: &'a dyn AccountStore,
    pub enforce_unique_passwords: bool,
}

/// Uniqueness for an update: the account being updated is excluded
pub struct ExistingAccountUniqueness<'a> {
    pub store: &'a dyn AccountStore,
    pub enforce_unique_passwords: bool,
    pub user_id: &'a UserId,
}

/// Whether `password` matches none of the stored hashes
///
/// One bcrypt verification per hash, run on the blocking pool.
async fn password_unused(password: &str, hashes: Vec<String>) -> Result<bool> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || -> Result<bool> {
        for hash in &hashes {
            let matches = bcrypt::verify(&password, hash)
                .map_err(|e| AccountError::storage(e.to_string()))?;
            if matches {
                return Ok(false);
            }
        }
        Ok(true)
    })
    .await
    .map_err(|e| AccountError::storage(format!("Password check failed: {e}")))?
}

#[async_trait]
impl UniquenessCheck for NewAccountUniqueness<'_> {
    async fn is_email_unique(&self, email: &str) -> Result<bool> {
        Ok(!self.store.email_exists(email, None).await?)
    }

    async fn is_password_unique(&self, password: &str) -> Result<bool> {
        if !self.enforce_unique_passwords {
            return Ok(true);
        }
        let hashes = self.store.password_hashes(None).await?;
        password_unused(password, hashes).await
    }
}

#[async_trait]
impl UniquenessCheck for ExistingAccountUniqueness<'_> {
    async fn is_email_unique(&self, email: &str) -> Result<bool> {
        Ok(!self.store.email_exists(email, Some(self.user_id)).await?)
    }

    async fn is_password_unique(&self, password: &str) -> Result<bool> {
        if !self.enforce_unique_passwords {
            return Ok(true);
        }
        let hashes = self.store.password_hashes(Some(self.user_id)).await?;
        password_unused(password, hashes).await
    }
}
