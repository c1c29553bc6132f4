//! Accounts Core
//!
//! Storage-agnostic domain types, traits, and error handling for the accounts service.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `User`, `Role`, `AccessToken` and their ids
//! - **Query Plan**: `UserListQuery`, the bounded listing plan built from raw parameters
//! - **Validation**: explicit request validation with structured error lists
//! - **Core Traits**: `AccountStore`, `UniquenessCheck`
//! - **Error Handling**: Unified `AccountError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use accounts_core::query::{ListUsersParams, PageLimits, SortField, UserListQuery};
//!
//! let params = ListUsersParams {
//!     limit: 0,
//!     order_by: Some("age".to_string()),
//!     ..Default::default()
//! };
//! let query = UserListQuery::from_params(&params, PageLimits::default()).unwrap();
//!
//! // A zero limit means "default page size"
//! assert_eq!(query.limit, 10);
//! assert_eq!(query.order_by, SortField::Age);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod query;
pub mod storage;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use error::{AccountError, ErrorKind, Result};
pub use query::{ListUsersParams, PageLimits, SortDirection, SortField, UserListQuery, UserPage};
pub use storage::AccountStore;
pub use types::{AccessToken, NewUser, Role, UpdateUser, User, UserCredentials, UserId};
pub use validation::{UniquenessCheck, ValidationError, ValidationErrors};
