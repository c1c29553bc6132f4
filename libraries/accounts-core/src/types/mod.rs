mod ids;
mod role;
mod token;
mod user;

pub use ids::UserId;
pub use role::Role;
pub use token::AccessToken;
pub use user::{NewUser, UpdateUser, User, UserCredentials};
