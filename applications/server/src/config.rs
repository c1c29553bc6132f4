/// Server configuration
use crate::error::{Result, ServerError};
use accounts_core::PageLimits;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix; sections are separated by `__`
/// (e.g. `ACCOUNTS_AUTH__JWT_SECRET`)
pub const ENV_PREFIX: &str = "ACCOUNTS";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub listing: ListingSettings,

    #[serde(default)]
    pub validation: ValidationSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthSettings {
    /// HS256 signing key; required
    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_issuer")]
    pub issuer: String,

    #[serde(default = "default_audience")]
    pub audience: String,

    #[serde(default = "default_token_lifetime_minutes")]
    pub token_lifetime_minutes: u64,

    /// Clock skew tolerated when checking `nbf` and `exp`
    #[serde(default)]
    pub leeway_seconds: u64,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    #[serde(default)]
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListingSettings {
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ValidationSettings {
    /// Reject passwords already used by another account
    ///
    /// Salted hashes cannot be looked up, so every register and update runs one
    /// bcrypt verification per stored account. Cost grows linearly with the user
    /// count; the checks run on the blocking pool.
    #[serde(default)]
    pub enforce_unique_passwords: bool,
}

impl ServerConfig {
    /// Load configuration from file and environment
    ///
    /// Reads `path` when given (it must exist), otherwise `config.toml` if present,
    /// then applies `ACCOUNTS_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let config_path = PathBuf::from("config.toml");
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ServerError::Config(
                "JWT secret is required (set ACCOUNTS_AUTH__JWT_SECRET)".to_string(),
            ));
        }

        if self.auth.token_lifetime_minutes == 0 {
            return Err(ServerError::Config(
                "auth.token_lifetime_minutes must be greater than zero".to_string(),
            ));
        }

        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(ServerError::Config(format!(
                "auth.bcrypt_cost must be between 4 and 31, got {}",
                self.auth.bcrypt_cost
            )));
        }

        if self.listing.default_limit == 0 || self.listing.default_limit > self.listing.max_limit {
            return Err(ServerError::Config(format!(
                "listing.default_limit ({}) must be between 1 and listing.max_limit ({})",
                self.listing.default_limit, self.listing.max_limit
            )));
        }

        Ok(())
    }
}

impl ListingSettings {
    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_limit: self.default_limit,
            max_limit: self.max_limit,
        }
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_database_url() -> String {
    "sqlite://./data/accounts.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_issuer() -> String {
    "accounts-server".to_string()
}

fn default_audience() -> String {
    "accounts-clients".to_string()
}

fn default_token_lifetime_minutes() -> u64 {
    60
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_cookie_name() -> String {
    "AccessToken".to_string()
}

fn default_limit() -> u32 {
    accounts_core::query::DEFAULT_PAGE_SIZE
}

fn default_max_limit() -> u32 {
    accounts_core::query::MAX_PAGE_SIZE
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            issuer: default_issuer(),
            audience: default_audience(),
            token_lifetime_minutes: default_token_lifetime_minutes(),
            leeway_seconds: 0,
            bcrypt_cost: default_bcrypt_cost(),
            cookie_name: default_cookie_name(),
            secure_cookie: false,
        }
    }
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}
