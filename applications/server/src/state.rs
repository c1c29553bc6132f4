/// Shared application state
use crate::config::ServerConfig;
use crate::services::{AuthService, UserService};
use accounts_core::AccountStore;
use std::sync::Arc;

/// Cookie attributes used when setting and clearing the token cookie
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AccountStore>,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub cookie: CookieSettings,
}

impl AppState {
    pub fn new(store: Arc<dyn AccountStore>, config: &ServerConfig) -> Self {
        let auth = Arc::new(AuthService::new(&config.auth));
        let users = Arc::new(UserService::new(
            Arc::clone(&store),
            Arc::clone(&auth),
            config.listing.page_limits(),
            config.validation.enforce_unique_passwords,
        ));

        Self {
            store,
            auth,
            users,
            cookie: CookieSettings {
                name: config.auth.cookie_name.clone(),
                secure: config.auth.secure_cookie,
            },
        }
    }
}
