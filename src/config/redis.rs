//! Redis settings. One server backs both the presence set and pub/sub.

use std::time::Duration;

use serde::Deserialize;

use super::error::ValidationError;
use crate::adapters::presence::DEFAULT_PRESENCE_KEY;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub url: String,

    /// Bound on the initial connection attempt.
    pub timeout_secs: u64,

    /// Set holding the ids of online users. Processes that should share
    /// presence must agree on it.
    pub presence_key: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: 5,
            presence_key: DEFAULT_PRESENCE_KEY.to_string(),
        }
    }
}

impl RedisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.trim().is_empty() {
            return Err(ValidationError::MissingRequired("REDIS_URL"));
        }
        if !(self.url.starts_with("redis://") || self.url.starts_with("rediss://")) {
            return Err(ValidationError::InvalidRedisUrl);
        }
        if self.presence_key.trim().is_empty() {
            return Err(ValidationError::MissingRequired("REDIS_PRESENCE_KEY"));
        }
        Ok(())
    }
}
