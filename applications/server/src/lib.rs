//! Accounts Server Library
//!
//! HTTP service for user accounts: registration, token login, listing and roles.
//!
//! This library exposes the core components for testing purposes.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use services::{AuthService, UserService};
pub use state::AppState;
