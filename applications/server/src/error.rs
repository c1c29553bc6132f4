/// Server error types
use accounts_core::{AccountError, ErrorKind};
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Account(#[from] AccountError),

    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

impl From<accounts_storage::StorageError> for ServerError {
    fn from(err: accounts_storage::StorageError) -> Self {
        ServerError::Account(err.into())
    }
}

// Extractor rejections answer like any other bad parameter
impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::Account(AccountError::invalid_input(rejection.body_text()))
    }
}

impl From<QueryRejection> for ServerError {
    fn from(rejection: QueryRejection) -> Self {
        ServerError::Account(AccountError::invalid_input(rejection.body_text()))
    }
}

impl ServerError {
    /// Status code this error is answered with
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Account(err) => match err.kind() {
                ErrorKind::UserNotFound => StatusCode::NOT_FOUND,
                ErrorKind::RoleNotFound
                | ErrorKind::InvalidInput
                | ErrorKind::Validation
                | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
                ErrorKind::InvalidCredentials => StatusCode::UNAUTHORIZED,
                ErrorKind::TokenSigning | ErrorKind::TokenPersistence | ErrorKind::Storage => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ServerError::Unauthorized(_) | ServerError::Jwt(_) => StatusCode::UNAUTHORIZED,
            ServerError::Internal(_) | ServerError::Config(_) | ServerError::Bcrypt(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Snake_case kind reported in the response body
    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::Account(err) => err.kind().as_str(),
            ServerError::Unauthorized(_) | ServerError::Jwt(_) => "unauthorized",
            ServerError::Internal(_) | ServerError::Bcrypt(_) => "internal",
            ServerError::Config(_) => "config",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        let mut body = match &self {
            ServerError::Account(
                AccountError::Validation(errors) | AccountError::Conflict(errors),
            ) => json!({
                "error": errors.to_string(),
                "details": errors,
            }),
            ServerError::Jwt(e) => {
                tracing::warn!("Rejected token: {}", e);
                json!({ "error": "Invalid token" })
            }
            _ if status.is_server_error() => {
                tracing::error!("{}", self);
                json!({ "error": "Internal server error" })
            }
            other => json!({ "error": other.to_string() }),
        };

        if let Value::Object(map) = &mut body {
            map.insert("kind".to_string(), Value::from(kind));
        }

        (status, Json(body)).into_response()
    }
}
