/// ID types for account entities
use crate::error::{AccountError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// User identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a user ID from a trusted string (e.g. a database row)
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random user ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse an untrusted id, rejecting anything that is not a UUID
    pub fn parse(id: &str) -> Result<Self> {
        Uuid::parse_str(id.trim())
            .map(|uuid| Self(uuid.to_string()))
            .map_err(|_| AccountError::invalid_input(format!("Invalid user id: {id}")))
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_generation_creates_unique_ids() {
        let id1 = UserId::generate();
        let id2 = UserId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn parse_normalizes_case() {
        let id = UserId::parse("6F9619FF-8B86-D011-B42D-00C04FC964FF").unwrap();
        assert_eq!(id.as_str(), "6f9619ff-8b86-d011-b42d-00c04fc964ff");
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = UserId::parse("not-a-uuid").unwrap_err();
        assert!(matches!(err, AccountError::InvalidInput(_)));
    }
}
