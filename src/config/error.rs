//! Configuration errors.

use thiserror::Error;

/// Failure to produce a usable `AppConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ValidationError),
}

/// A configuration value that parsed but cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required setting: {0}")]
    MissingRequired(&'static str),

    #[error("Cannot bind to host '{0}'")]
    InvalidBindAddress(String),

    #[error("Port must be non-zero")]
    InvalidPort,

    #[error("Request timeout must be between 1 and 300 seconds")]
    InvalidTimeout,

    #[error("Database URL must start with postgres:// or postgresql://")]
    InvalidDatabaseUrl,

    #[error("Redis URL must start with redis:// or rediss://")]
    InvalidRedisUrl,

    #[error("Database min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Database pool may not exceed 100 connections")]
    PoolSizeTooLarge,

    #[error("JWT secret must be at least {0} bytes in production")]
    JwtSecretTooShort(usize),

    #[error("Unsupported JWT algorithm: {0}")]
    UnsupportedJwtAlgorithm(String),

    #[error("Outbound buffer must be between 1 and {0}")]
    InvalidOutboundBuffer(usize),

    #[error("Write timeout must be between 1 and {0} ms")]
    InvalidWriteTimeout(u64),
}
