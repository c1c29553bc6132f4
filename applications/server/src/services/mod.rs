/// Server services
pub mod auth;
pub mod uniqueness;
pub mod users;

pub use auth::{AuthService, Claims, IssuedToken};
pub use uniqueness::{ExistingAccountUniqueness, NewAccountUniqueness};
pub use users::{LoginResult, UserService};
