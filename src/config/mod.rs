//! Process configuration.
//!
//! Every setting comes from the environment (plus `.env` in development),
//! prefixed `CHAT_RELAY` with `__` between path segments:
//!
//! ```text
//! CHAT_RELAY__SERVER__PORT=8000        server.port
//! CHAT_RELAY__DATABASE__URL=...        database.url
//! CHAT_RELAY__AUTH__JWT_SECRET=...     auth.jwt_secret
//! ```
//!
//! `database`, `redis` and `auth` must be present; the other sections
//! fall back to defaults. `AppConfig::validate` checks cross-field rules
//! after loading.

mod auth;
mod database;
mod delivery;
mod error;
mod redis;
mod server;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use delivery::DeliveryConfig;
pub use error::{ConfigError, ValidationError};
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

impl AppConfig {
    /// Read configuration from the environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(ConfigError::Load(config::ConfigError::Message(e.to_string())));
            }
        }

        let source = config::Environment::with_prefix("CHAT_RELAY").separator("__");
        Ok(config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.redis.validate()?;
        self.auth.validate(self.server.environment)?;
        self.delivery.validate()
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const BASE: &[(&str, &str)] = &[
        ("CHAT_RELAY__DATABASE__URL", "postgresql://test@localhost/chat"),
        ("CHAT_RELAY__REDIS__URL", "redis://localhost:6379"),
        ("CHAT_RELAY__AUTH__JWT_SECRET", "dev-secret"),
    ];

    /// Load with exactly `vars` set, restoring a clean environment after.
    fn load_with(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        for (key, value) in vars {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        for (key, _) in vars {
            env::remove_var(key);
        }
        result
    }

    fn base_with(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        BASE.iter().chain(extra).copied().collect()
    }

    #[test]
    fn required_sections_load_with_defaults_elsewhere() {
        let config = load_with(BASE).unwrap();

        assert_eq!(config.database.url, "postgresql://test@localhost/chat");
        assert_eq!(config.redis.presence_key, "online_users");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.delivery.outbound_buffer, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn nested_overrides_are_applied() {
        let config = load_with(&base_with(&[
            ("CHAT_RELAY__SERVER__PORT", "3000"),
            ("CHAT_RELAY__DELIVERY__OUTBOUND_BUFFER", "8"),
        ]))
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.delivery.outbound_buffer, 8);
    }

    #[test]
    fn production_rejects_short_secret() {
        let config =
            load_with(&base_with(&[("CHAT_RELAY__SERVER__ENVIRONMENT", "production")])).unwrap();

        assert!(config.is_production());
        assert_eq!(config.validate(), Err(ValidationError::JwtSecretTooShort(32)));
    }

    #[test]
    fn missing_database_section_fails_to_load() {
        let result = load_with(&BASE[1..]);
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
