/// Fixed role set
use crate::error::AccountError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role a user can hold
///
/// The discriminant is the role's ordinal. Ordinals double as primary keys of the
/// seeded `roles` table and never change; a higher ordinal is a more privileged role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Role {
    /// Granted to every user on registration
    User = 0,
    /// Administrator
    Admin = 1,
    /// Support staff
    Support = 2,
    /// Super administrator
    SuperAdmin = 3,
}

impl Role {
    /// All roles in ordinal order
    pub const ALL: [Role; 4] = [Role::User, Role::Admin, Role::Support, Role::SuperAdmin];

    /// Stable ordinal of this role
    pub fn ordinal(self) -> i64 {
        self as i64
    }

    /// Look up a role by ordinal
    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.ordinal() == ordinal)
    }

    /// Canonical role name
    pub fn name(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Admin => "Admin",
            Role::Support => "Support",
            Role::SuperAdmin => "SuperAdmin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts a role name (case-insensitive) or its ordinal
impl FromStr for Role {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(ordinal) = s.parse::<i64>() {
            return Self::from_ordinal(ordinal).ok_or_else(|| AccountError::RoleNotFound(s.to_string()));
        }
        Self::ALL
            .into_iter()
            .find(|role| role.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| AccountError::RoleNotFound(s.to_string()))
    }
}
