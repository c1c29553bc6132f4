/// Authentication service - JWT and password handling
use crate::config::AuthSettings;
use crate::error::{Result, ServerError};
use accounts_core::{AccountError, UserId};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    lifetime: Duration,
    leeway_seconds: u64,
    bcrypt_cost: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub aud: String,
    pub sub: String, // Subject (user ID)
    pub email: String,
    pub nbf: i64,
    pub iat: i64,
    pub exp: i64,
    /// Unique per token, so two logins in the same second never collide
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> UserId {
        UserId::new(self.sub.clone())
    }
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AuthService {
    pub fn new(settings: &AuthSettings) -> Self {
        let lifetime_minutes = i64::try_from(settings.token_lifetime_minutes).unwrap_or(i64::MAX);

        Self {
            encoding_key: EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
            lifetime: Duration::try_minutes(lifetime_minutes).unwrap_or(Duration::MAX),
            leeway_seconds: settings.leeway_seconds,
            bcrypt_cost: settings.bcrypt_cost,
        }
    }

    /// Hash a password using bcrypt
    pub async fn hash_password(&self, password: &str) -> Result<String> {
        let cost = self.bcrypt_cost;
        let password = password.to_owned();
        run_bcrypt(move || bcrypt::hash(password, cost)).await
    }

    /// Verify a password against a hash
    pub async fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        run_bcrypt(move || bcrypt::verify(password, &hash)).await
    }

    /// Sign an access token valid from now
    pub fn issue_token(&self, user_id: &UserId, email: &str) -> Result<IssuedToken> {
        self.issue_token_at(user_id, email, Utc::now())
    }

    /// Sign an access token valid from `now`
    pub fn issue_token_at(
        &self,
        user_id: &UserId,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken> {
        let expires_at = now
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| AccountError::TokenSigning("Token lifetime overflows".to_string()))?;

        let claims = Claims {
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            sub: user_id.as_str().to_string(),
            email: email.to_string(),
            nbf: now.timestamp(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AccountError::TokenSigning(e.to_string()))?;

        Ok(IssuedToken {
            token,
            issued_at: now,
            expires_at,
        })
    }

    /// Verify signature, issuer, audience, `nbf` and `exp`, and decode the claims
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);
        validation.validate_nbf = true;
        validation.leeway = self.leeway_seconds;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }
}

/// Run a bcrypt call on the blocking pool so it does not stall the runtime
async fn run_bcrypt<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> std::result::Result<T, bcrypt::BcryptError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ServerError::Internal(format!("Password task failed: {e}")))?
        .map_err(ServerError::from)
}
