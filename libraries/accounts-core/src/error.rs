/// Core error types for the accounts service
use crate::validation::{ValidationError, ValidationErrors};
use serde::Serialize;
use thiserror::Error;

/// Result type alias using `AccountError`
pub type Result<T> = std::result::Result<T, AccountError>;

/// Core error type for account operations
#[derive(Error, Debug)]
pub enum AccountError {
    /// No user with the given id (or email) exists
    #[error("User is not found: {0}")]
    UserNotFound(String),

    /// Role name does not match one of the fixed roles
    #[error("Role is not found: {0}")]
    RoleNotFound(String),

    /// Malformed request parameter (negative limit, bad id, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Request failed one or more validation rules
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// A value that must be unique is already taken
    ///
    /// Raised by validation when only uniqueness rules failed, and by the store
    /// when a unique constraint fires.
    #[error("Conflict: {0}")]
    Conflict(ValidationErrors),

    /// Unknown email or wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The token could not be signed
    #[error("Failed to sign access token: {0}")]
    TokenSigning(String),

    /// The token was signed but could not be recorded
    #[error("Access token was signed but could not be recorded: {0}")]
    TokenPersistence(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Machine-readable category of an [`AccountError`]
///
/// The transport layer maps kinds to status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`AccountError::UserNotFound`]
    UserNotFound,
    /// See [`AccountError::RoleNotFound`]
    RoleNotFound,
    /// See [`AccountError::InvalidInput`]
    InvalidInput,
    /// See [`AccountError::Validation`]
    Validation,
    /// See [`AccountError::Conflict`]
    Conflict,
    /// See [`AccountError::InvalidCredentials`]
    InvalidCredentials,
    /// See [`AccountError::TokenSigning`]
    TokenSigning,
    /// See [`AccountError::TokenPersistence`]
    TokenPersistence,
    /// See [`AccountError::Storage`]
    Storage,
}

impl ErrorKind {
    /// Stable snake_case name, used in response bodies
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserNotFound => "user_not_found",
            Self::RoleNotFound => "role_not_found",
            Self::InvalidInput => "invalid_input",
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::InvalidCredentials => "invalid_credentials",
            Self::TokenSigning => "token_signing",
            Self::TokenPersistence => "token_persistence",
            Self::Storage => "storage",
        }
    }
}

impl AccountError {
    /// Create a user not found error
    pub fn user_not_found(id: impl ToString) -> Self {
        Self::UserNotFound(id.to_string())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a conflict on a single field
    pub fn conflict(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::default();
        errors.push(ValidationError::new(field, message));
        Self::Conflict(errors)
    }

    /// Failed rules carried by `Validation` and `Conflict`
    pub fn details(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) | Self::Conflict(errors) => Some(errors),
            _ => None,
        }
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound(_) => ErrorKind::UserNotFound,
            Self::RoleNotFound(_) => ErrorKind::RoleNotFound,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::InvalidCredentials => ErrorKind::InvalidCredentials,
            Self::TokenSigning(_) => ErrorKind::TokenSigning,
            Self::TokenPersistence(_) => ErrorKind::TokenPersistence,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<ValidationErrors> for AccountError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for AccountError {
    fn from(err: sqlx::Error) -> Self {
        // Unique constraints back the validation-time uniqueness checks
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return Self::conflict("record", db_err.message());
            }
        }
        Self::Storage(err.to_string())
    }
}
