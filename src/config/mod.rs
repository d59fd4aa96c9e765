//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `TENANT_ACCESS` prefix
//! and `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use tenant_access::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr().unwrap());
//! ```

mod access;
mod database;
mod error;
mod redis;
mod server;

pub use access::AccessConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use redis::RedisConfig;
pub use server::{Environment, LogFormat, ServerConfig};

use serde::Deserialize;

const ENV_PREFIX: &str = "TENANT_ACCESS";

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    /// Without Redis the handoff store is kept in memory
    #[serde(default)]
    pub redis: Option<RedisConfig>,

    #[serde(default)]
    pub access: AccessConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` if present
    /// 2. Reads variables with the `TENANT_ACCESS` prefix
    /// 3. Splits nested keys on `__`
    ///
    /// - `TENANT_ACCESS__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `TENANT_ACCESS__ACCESS__GLOBAL_SCOPE_ID=admin` -> `access.global_scope_id`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load and validate in one step.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        if let Some(redis) = &self.redis {
            redis.validate()?;
        }
        self.access.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
