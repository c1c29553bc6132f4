//! User listing query plan
//!
//! Raw listing parameters arrive as untrusted, loosely typed values. They are
//! turned into a [`UserListQuery`] here, which is the only form the storage
//! layer accepts: limits are non-negative and bounded, the sort field comes
//! from a closed set, and the filter is already normalized.

use crate::error::{AccountError, Result};
use crate::types::User;
use serde::{Deserialize, Serialize};

/// Page size used when the caller passes `limit = 0`
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound for any page
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw listing parameters as received from a caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListUsersParams {
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub order_by: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub filter: Option<String>,
}

/// Page size bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    /// Page size substituted for `limit = 0`
    pub default_limit: u32,
    /// Largest page size ever planned
    pub max_limit: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_SIZE,
            max_limit: MAX_PAGE_SIZE,
        }
    }
}

/// Field users can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Id,
    #[default]
    Name,
    Email,
    Age,
    /// Highest role ordinal the user holds
    Role,
}

impl SortField {
    /// Parse a sort field; unknown or missing values order by name
    pub fn parse(value: Option<&str>) -> Self {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::default();
        };

        match value.to_ascii_lowercase().as_str() {
            "id" => Self::Id,
            "name" => Self::Name,
            "email" => Self::Email,
            "age" => Self::Age,
            "role" => Self::Role,
            other => {
                tracing::debug!("Unknown order_by {:?}, ordering by name", other);
                Self::Name
            }
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Parse a direction; anything other than `desc` is ascending
    pub fn parse(value: Option<&str>) -> Self {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::default();
        };

        if value.eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            if !value.eq_ignore_ascii_case("asc") {
                tracing::warn!("Unrecognized sort direction {:?}, using ascending", value);
            }
            Self::Asc
        }
    }

    /// SQL keyword for this direction
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Validated, bounded listing plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserListQuery {
    /// Number of users to return, always in `1..=max_limit`
    pub limit: u32,
    /// Number of matching users to skip
    pub offset: u64,
    pub order_by: SortField,
    pub direction: SortDirection,
    /// Lowercased, trimmed filter text; `None` when no filtering applies
    pub filter: Option<String>,
}

impl UserListQuery {
    /// Build a plan from raw parameters
    ///
    /// # Errors
    /// Returns `InvalidInput` for a negative limit or offset.
    pub fn from_params(params: &ListUsersParams, limits: PageLimits) -> Result<Self> {
        if params.limit < 0 || params.offset < 0 {
            return Err(AccountError::invalid_input("Invalid limit or offset"));
        }

        let max_limit = limits.max_limit.max(1);
        let limit = if params.limit == 0 {
            limits.default_limit.clamp(1, max_limit)
        } else {
            u32::try_from(params.limit).map_or(max_limit, |limit| limit.min(max_limit))
        };

        let filter = params
            .filter
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_lowercase);

        Ok(Self {
            limit,
            offset: params.offset.unsigned_abs(),
            order_by: SortField::parse(params.order_by.as_deref()),
            direction: SortDirection::parse(params.sort.as_deref()),
            filter,
        })
    }

    /// `LIKE` pattern for the filter, with wildcards in the user text escaped by `\`
    pub fn like_pattern(&self) -> Option<String> {
        self.filter.as_ref().map(|filter| {
            let mut pattern = String::with_capacity(filter.len() + 2);
            pattern.push('%');
            for c in filter.chars() {
                if matches!(c, '%' | '_' | '\\') {
                    pattern.push('\\');
                }
                pattern.push(c);
            }
            pattern.push('%');
            pattern
        })
    }
}

/// One page of listing results
#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub users: Vec<User>,
    /// Number of users matching the filter, across all pages
    pub total: u64,
    pub limit: u32,
    pub offset: u64,
}
