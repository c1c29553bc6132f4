/// User domain type
use super::{ids::UserId, role::Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User account
///
/// Never carries the password hash; see [`UserCredentials`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: UserId,

    /// Display name
    pub name: String,

    /// Age in years
    pub age: u32,

    /// Unique email address
    pub email: String,

    /// Roles held, sorted by ordinal
    pub roles: Vec<Role>,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Most privileged role held
    pub fn highest_role(&self) -> Option<Role> {
        self.roles.iter().copied().max()
    }
}

/// Data for creating a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub age: u32,
    /// Already hashed password
    pub password_hash: String,
}

/// Replacement values for every mutable user field
#[derive(Debug, Clone)]
pub struct UpdateUser {
    pub name: String,
    pub email: String,
    pub age: u32,
    /// Already hashed password
    pub password_hash: String,
}

/// A user together with the stored password hash, used only for login
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}
