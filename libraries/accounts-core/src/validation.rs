//! Request validation
//!
//! Validation runs before any mutation and reports every failing field at once.
//! Rules that depend on persisted state go through [`UniquenessCheck`], which the
//! caller picks per request type (new account vs. existing account).

use crate::error::{AccountError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// A single failed rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Ordered list of failed rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Whether any rule failed for `field`
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// `Ok(())` when nothing failed, otherwise a `Validation` error
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AccountError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        f.write_str(&messages.join("; "))
    }
}

/// Uniqueness predicates backed by persisted state
#[async_trait]
pub trait UniquenessCheck: Send + Sync {
    /// No other account uses `email`
    async fn is_email_unique(&self, email: &str) -> Result<bool>;

    /// No other account uses `password`
    async fn is_password_unique(&self, password: &str) -> Result<bool>;
}

/// Fields shared by registration and full update requests
#[derive(Debug, Clone, Copy)]
pub struct AccountFields<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub age: i64,
}

/// Validate registration/update fields
///
/// Each field reports at most one failure: the first rule it breaks. Uniqueness is
/// only queried for values that passed the local rules.
///
/// # Errors
/// `Conflict` when the only failures are taken values, `Validation` with every
/// failing field otherwise, or the error from the uniqueness check.
pub async fn validate_account(
    fields: &AccountFields<'_>,
    uniqueness: &dyn UniquenessCheck,
) -> Result<()> {
    let mut errors = ValidationErrors::default();
    let mut conflicts = 0;

    if fields.name.trim().is_empty() {
        errors.push(ValidationError::new("name", "Name is empty"));
    }

    if fields.email.trim().is_empty() {
        errors.push(ValidationError::new("email", "Email is empty"));
    } else if !is_valid_email(fields.email) {
        errors.push(ValidationError::new("email", "Email is not corrected"));
    } else if !uniqueness.is_email_unique(fields.email.trim()).await? {
        errors.push(ValidationError::new("email", "Email is not unique"));
        conflicts += 1;
    }

    if fields.age < 0 || u32::try_from(fields.age).is_err() {
        errors.push(ValidationError::new("age", "Age is not corrected"));
    }

    if fields.password.is_empty() {
        errors.push(ValidationError::new("password", "Password is empty"));
    } else if !uniqueness.is_password_unique(fields.password).await? {
        errors.push(ValidationError::new("password", "Password is not unique"));
        conflicts += 1;
    }

    if !errors.is_empty() && conflicts == errors.errors().len() {
        return Err(AccountError::Conflict(errors));
    }
    errors.into_result()
}

/// Validate login fields
///
/// # Errors
/// `Validation` with every failing field.
pub fn validate_login(email: &str, password: &str) -> Result<()> {
    let mut errors = ValidationErrors::default();

    if email.trim().is_empty() {
        errors.push(ValidationError::new("email", "Email is empty"));
    } else if !is_valid_email(email) {
        errors.push(ValidationError::new("email", "Email is not corrected"));
    }

    if password.is_empty() {
        errors.push(ValidationError::new("password", "Password is empty"));
    }

    errors.into_result()
}

/// Minimal structural email check: one `@`, non-empty local part and domain, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        email_unique: bool,
        password_unique: bool,
    }

    #[async_trait]
    impl UniquenessCheck for Fixed {
        async fn is_email_unique(&self, _email: &str) -> Result<bool> {
            Ok(self.email_unique)
        }

        async fn is_password_unique(&self, _password: &str) -> Result<bool> {
            Ok(self.password_unique)
        }
    }

    const ALL_UNIQUE: Fixed = Fixed {
        email_unique: true,
        password_unique: true,
    };

    fn fields<'a>(name: &'a str, email: &'a str, password: &'a str, age: i64) -> AccountFields<'a> {
        AccountFields {
            name,
            email,
            password,
            age,
        }
    }

    #[test]
    fn email_format() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("  bob@localhost "));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("alice@"));
        assert!(!is_valid_email("a@b@c"));
        assert!(!is_valid_email("al ice@example.com"));
    }

    #[tokio::test]
    async fn valid_account_passes() {
        let result = validate_account(&fields("Alice", "alice@example.com", "pw", 30), &ALL_UNIQUE).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn reports_every_failing_field() {
        let err = validate_account(&fields(" ", "", "", -1), &ALL_UNIQUE)
            .await
            .unwrap_err();

        let AccountError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let messages: Vec<_> = errors.errors().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["Name is empty", "Email is empty", "Age is not corrected", "Password is empty"]
        );
    }

    #[tokio::test]
    async fn duplicate_email_and_password_are_conflicts() {
        let taken = Fixed {
            email_unique: false,
            password_unique: false,
        };
        let err = validate_account(&fields("Alice", "alice@example.com", "pw", 30), &taken)
            .await
            .unwrap_err();

        let AccountError::Conflict(errors) = err else {
            panic!("expected conflict error");
        };
        assert!(errors.has_field("email"));
        assert!(errors.has_field("password"));
        assert_eq!(errors.to_string(), "Email is not unique; Password is not unique");
    }

    #[tokio::test]
    async fn taken_email_with_other_failures_is_validation() {
        let taken = Fixed {
            email_unique: false,
            password_unique: true,
        };
        let err = validate_account(&fields("", "alice@example.com", "pw", 30), &taken)
            .await
            .unwrap_err();

        let AccountError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.to_string(), "Name is empty; Email is not unique");
    }

    #[test]
    fn login_rules() {
        assert!(validate_login("alice@example.com", "pw").is_ok());

        let err = validate_login("nope", "").unwrap_err();
        let AccountError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.errors().len(), 2);
        assert_eq!(errors.errors()[0].message, "Email is not corrected");
    }
}
